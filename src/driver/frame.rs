use resvg::tiny_skia::Pixmap;

use crate::assets::catalog::TextureCatalog;
use crate::assets::color::{hsl_to_rgba8, parse_hex_color};
use crate::assets::manifest::{Attachment, Slot};
use crate::driver::settings::{Settings, Viewport};
use crate::foundation::core::{Placement, Vec2, clamp_delta_secs};
use crate::foundation::error::{PuffsError, PuffsResult};
use crate::foundation::math::Rng64;
use crate::input::events::InputEvent;
use crate::input::keyboard::Keyboard;
use crate::motion::camera::Camera;
use crate::render::background::{draw_grid, draw_vignette};
use crate::render::canvas::Canvas2D;
use crate::render::outline::OutlineSettings;
use crate::rig::character::Character;
use crate::rig::draw::RigRenderer;

/// Counters since the driver was created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Simulation steps taken.
    pub ticks: u64,
    /// Frames drawn successfully.
    pub frames_rendered: u64,
    /// Frames whose draw failed and was skipped.
    pub frames_skipped: u64,
    /// Texture tasks run by the per-tick pump.
    pub tasks_run: u64,
}

/// The single frame loop: input, physics, camera, texture work and one composed draw per tick.
#[derive(Debug)]
pub struct FrameDriver {
    settings: Settings,
    catalog: TextureCatalog,
    character: Character,
    camera: Camera,
    keyboard: Keyboard,
    renderer: RigRenderer,
    canvas: Canvas2D,
    pointer: Vec2,
    last_timestamp: Option<f64>,
    rng: Rng64,
    stats: FrameStats,
}

impl FrameDriver {
    /// Build a driver around a loaded catalog; the camera starts snapped on the character.
    pub fn new(settings: Settings, mut catalog: TextureCatalog) -> PuffsResult<Self> {
        settings.validate()?;
        catalog.set_outline_settings(settings.outline);

        let viewport = settings.viewport.size();
        let canvas = Canvas2D::new(settings.viewport.width, settings.viewport.height)?;
        let character = Character::new(settings.rig, settings.seed);
        let mut camera = Camera::new(settings.camera, viewport, settings.seed.wrapping_add(1));
        camera.snap(character.position());

        Ok(Self {
            rng: Rng64::new(settings.seed.wrapping_add(2)),
            pointer: viewport / 2.0,
            settings,
            catalog,
            character,
            camera,
            keyboard: Keyboard::new(),
            renderer: RigRenderer::new(),
            canvas,
            last_timestamp: None,
            stats: FrameStats::default(),
        })
    }

    /// Replace the rig renderer (e.g. one whose labels use preloaded fonts).
    pub fn with_renderer(mut self, renderer: RigRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Settings in effect.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Texture catalog.
    pub fn catalog(&self) -> &TextureCatalog {
        &self.catalog
    }

    /// Texture catalog, mutably.
    pub fn catalog_mut(&mut self) -> &mut TextureCatalog {
        &mut self.catalog
    }

    /// Character state.
    pub fn character(&self) -> &Character {
        &self.character
    }

    /// Character state, mutably.
    pub fn character_mut(&mut self) -> &mut Character {
        &mut self.character
    }

    /// Camera state.
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Counters.
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Last composed frame.
    pub fn frame(&self) -> &Pixmap {
        self.canvas.pixmap()
    }

    /// Pointer position in world space, for overlays.
    pub fn world_cursor(&self) -> Vec2 {
        self.camera.unproject_point(self.pointer)
    }

    /// Resize the output surface; the camera keeps its focus and re-centers on the new size.
    pub fn resize(&mut self, width: u32, height: u32) -> PuffsResult<()> {
        self.canvas.resize(width, height)?;
        self.settings.viewport = Viewport { width, height };
        self.camera.set_viewport(self.settings.viewport.size());
        self.pointer = self.settings.viewport.size() / 2.0;
        Ok(())
    }

    /// Apply one input event.
    ///
    /// Errors (bad color strings, unknown keys, rejected uploads) leave the state unchanged.
    pub fn handle_event(&mut self, event: InputEvent) -> PuffsResult<()> {
        match event {
            InputEvent::KeyDown { code, repeat } => {
                self.keyboard.key_down(&code, repeat);
            }
            InputEvent::KeyUp { code } => {
                self.keyboard.key_up(&code);
            }
            InputEvent::Blur => self.keyboard.clear(),
            InputEvent::Focus => self.camera.snap(self.character.position()),
            InputEvent::PointerMove(device) => self.pointer = device,
            InputEvent::Click => self.click(),
            InputEvent::OutlineColor(hex) => {
                let color = parse_hex_color(&hex)?;
                let current = self.catalog.outline_settings();
                self.catalog
                    .set_outline_settings(OutlineSettings { color, ..current });
            }
            InputEvent::OutlineThickness(thickness) => self.set_outline_thickness(thickness)?,
            InputEvent::BodyColor(hex) => self.catalog.recolor(parse_hex_color(&hex)?),
            InputEvent::Equip { slot, key } => self.equip(slot, key.as_deref())?,
            InputEvent::Name(name) => self.character.set_name(&name),
            InputEvent::Upload {
                slot,
                file_name,
                mime,
                bytes,
            } => {
                self.upload(slot, &file_name, &mime, &bytes)?;
            }
            InputEvent::SetPlacement { key, placement } => self.set_placement(&key, placement)?,
            InputEvent::Randomize => self.randomize()?,
        }
        Ok(())
    }

    /// Primary action: trigger the weapon and shake the camera.
    pub fn click(&mut self) {
        self.character.trigger();
        self.camera.shake(self.settings.camera.click_shake);
    }

    /// Change the global outline thickness.
    pub fn set_outline_thickness(&mut self, thickness: f64) -> PuffsResult<()> {
        let next = OutlineSettings {
            thickness,
            ..self.catalog.outline_settings()
        };
        next.validate()?;
        self.catalog.set_outline_settings(next);
        Ok(())
    }

    /// Equip an asset by key, or clear the slot with `None`.
    pub fn equip(&mut self, slot: Slot, key: Option<&str>) -> PuffsResult<()> {
        let tag = match key {
            Some(key) => {
                let asset = self
                    .catalog
                    .get(key)
                    .ok_or_else(|| PuffsError::validation(format!("unknown asset '{key}'")))?;
                if matches!(asset.meta().attachment, Attachment::Upload { .. }) {
                    return Err(PuffsError::validation(format!(
                        "'{key}' is an upload placeholder"
                    )));
                }
                if asset.meta().slot != Some(slot) {
                    return Err(PuffsError::validation(format!(
                        "asset '{key}' does not fit the {slot:?} slot"
                    )));
                }
                asset.meta().attachment.behavior()
            }
            None => None,
        };
        self.character.equip(slot, key, tag);
        Ok(())
    }

    /// Add an uploaded file as a new attachment and equip it; returns the new key.
    pub fn upload(
        &mut self,
        slot: Slot,
        file_name: &str,
        mime: &str,
        bytes: &[u8],
    ) -> PuffsResult<String> {
        let key = self.catalog.upload(slot, file_name, mime, bytes)?;
        self.equip(slot, Some(&key))?;
        Ok(key)
    }

    /// Push an externally edited placement onto an attachment.
    pub fn set_placement(&mut self, key: &str, placement: Placement) -> PuffsResult<()> {
        self.catalog.set_placement(key, placement)
    }

    /// Random headwear, weapon and pastel body color.
    pub fn randomize(&mut self) -> PuffsResult<()> {
        for slot in [Slot::Headwear, Slot::Weapon] {
            let keys = self.catalog.keys_for_slot(slot);
            if keys.is_empty() {
                continue;
            }
            let key = keys[self.rng.next_index(keys.len())].to_owned();
            self.equip(slot, Some(&key))?;
        }
        let color = hsl_to_rgba8(
            self.rng.next_range(0.0, 360.0),
            self.rng.next_range(0.4, 1.0),
            self.rng.next_range(0.6, 1.0),
        );
        self.catalog.recolor(color);
        tracing::debug!(body = %color.to_hex(), "randomized");
        Ok(())
    }

    /// Advance to the display timestamp `now_secs`; the first call only records the clock.
    pub fn tick(&mut self, now_secs: f64) {
        let dt = match self.last_timestamp {
            Some(last) => now_secs - last,
            None => 0.0,
        };
        if now_secs.is_finite() {
            self.last_timestamp = Some(now_secs);
        }
        self.step(dt);
    }

    /// Advance by `dt` seconds (guarded and clamped), pump texture work and draw one frame.
    ///
    /// A failed draw is logged and skipped; the simulation keeps running.
    #[tracing::instrument(skip(self), fields(tick = self.stats.ticks))]
    pub fn step(&mut self, dt: f64) {
        let dt = clamp_delta_secs(dt, self.settings.max_delta_secs);

        let tag = self
            .character
            .equipped(Slot::Weapon)
            .and_then(|k| self.catalog.get(k))
            .and_then(|a| a.meta().attachment.behavior());
        self.character.sync_weapon(tag);

        let cursor = self.world_cursor();
        self.character.set_intent(self.keyboard.intent());
        self.character.set_cursor(cursor);
        self.character.update(dt);

        self.camera.focus(self.character.position());
        self.camera.set_pointer(cursor);
        self.camera.update(dt);

        let ran = self.catalog.pump(self.settings.tasks_per_tick);
        self.stats.tasks_run += ran as u64;
        self.stats.ticks += 1;

        match self.render() {
            Ok(()) => self.stats.frames_rendered += 1,
            Err(err) => {
                self.stats.frames_skipped += 1;
                tracing::warn!(%err, "frame skipped");
            }
        }
    }

    fn render(&mut self) -> PuffsResult<()> {
        let canvas = &mut self.canvas;
        canvas.clear();
        canvas.fill(self.settings.clear_rgba);

        canvas.save();
        self.camera.project(canvas);
        draw_grid(
            canvas,
            self.camera.visible_position(),
            self.camera.viewport(),
        );
        let outline = self.catalog.outline_settings();
        let drawn = self
            .renderer
            .draw(canvas, &self.character, &self.catalog, &outline);
        canvas.restore();
        drawn?;

        draw_vignette(canvas);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/driver/frame.rs"]
mod tests;
