//! Strip compositor.
//!
//! Every frame is decoded, scaled and treated on its own blocking task. The
//! tasks finish in any order; each draws into its own fixed cell and counts
//! down a shared [`DrawLatch`]. The strip is handed out only after the latch
//! opens and no draw has failed.

use std::sync::Arc;

use base64::Engine;
use image::RgbaImage;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::camera::types::RawFrame;
use crate::capture::sequencer::SHOT_COUNT;
use crate::codec;
use crate::events::{emit, BoothEvent, EventSink};
use crate::strip::error::{Result, StripError};
use crate::strip::latch::{CountDownGuard, DrawLatch};
use crate::strip::layout::{CellRect, CompositeLayout, StripLayout};
use crate::strip::text;
use crate::strip::treatment::Treatment;

const BACKGROUND: (u8, u8, u8) = (0x1a, 0x1a, 0x1a);
const BORDER_WIDTH: f32 = 4.0;
const BORDER_INSET: f32 = 2.0;

/// Turns a stored frame back into pixels.
pub trait FrameDecoder: Send + Sync {
    fn decode(&self, frame: &RawFrame) -> std::result::Result<RgbaImage, String>;
}

/// Decodes the PNG/JPEG bytes a frame was stored with.
pub struct RasterDecoder;

impl FrameDecoder for RasterDecoder {
    fn decode(&self, frame: &RawFrame) -> std::result::Result<RgbaImage, String> {
        codec::decode_rgba(frame.encoded())
    }
}

/// The finished memory strip.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StripArtifact {
    pub width: u32,
    pub height: u32,
    pub treatment: Treatment,
    pub cells: Vec<StripCell>,
    #[serde(skip)]
    pixels: RgbaImage,
}

/// A drawn photo cell and the label printed on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StripCell {
    pub label: String,
    #[serde(flatten)]
    pub rect: CellRect,
}

impl StripArtifact {
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn encode_png(&self) -> std::result::Result<Vec<u8>, String> {
        codec::encode_png_rgba(&self.pixels)
    }

    /// The strip as a `data:image/png;base64,...` URL.
    pub fn to_data_url(&self) -> std::result::Result<String, String> {
        let png = self.encode_png()?;
        Ok(format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(png)
        ))
    }
}

/// Composes ordered frames into a bordered vertical strip.
pub struct StripCompositor {
    layout: StripLayout,
    title: String,
    decoder: Arc<dyn FrameDecoder>,
    events: Option<EventSink>,
}

impl StripCompositor {
    pub fn new(layout: StripLayout, title: impl Into<String>) -> Self {
        Self {
            layout,
            title: title.into(),
            decoder: Arc::new(RasterDecoder),
            events: None,
        }
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn FrameDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = Some(events);
        self
    }

    /// Compose with today's date in the header.
    pub async fn compose(&self, frames: &[RawFrame], treatment: Treatment) -> Result<StripArtifact> {
        let date = chrono::Local::now().format("%-m/%-d/%Y").to_string();
        self.compose_dated(frames, treatment, &date).await
    }

    /// Compose with an explicit date line.
    ///
    /// Emits exactly one terminal event: `Ready` on success or `Error` if
    /// any frame failed to draw. A partial strip is never returned.
    pub async fn compose_dated(
        &self,
        frames: &[RawFrame],
        treatment: Treatment,
        date: &str,
    ) -> Result<StripArtifact> {
        match self.render(frames, treatment, date).await {
            Ok(artifact) => {
                let artifact = Arc::new(artifact);
                info!(
                    "strip ready: {}x{} with {} treatment",
                    artifact.width, artifact.height, treatment
                );
                emit(
                    self.events.as_ref(),
                    BoothEvent::Ready {
                        artifact: Arc::clone(&artifact),
                    },
                );
                Ok(Arc::unwrap_or_clone(artifact))
            }
            Err(e) => {
                error!("strip composition failed: {e}");
                emit(
                    self.events.as_ref(),
                    BoothEvent::Error {
                        message: e.to_string(),
                    },
                );
                Err(e)
            }
        }
    }

    async fn render(
        &self,
        frames: &[RawFrame],
        treatment: Treatment,
        date: &str,
    ) -> Result<StripArtifact> {
        check_frames(frames)?;
        self.layout.validate().map_err(StripError::Render)?;

        let plan = self.layout.compute(frames.len());
        let mut canvas = tiny_skia::Pixmap::new(plan.canvas_width, plan.canvas_height)
            .ok_or_else(|| StripError::Render("canvas has zero size".to_string()))?;
        paint_frame(&mut canvas, &plan)?;
        text::draw_best_effort(&mut canvas, &text::header_runs(&plan, &self.title, date));

        let canvas = Arc::new(Mutex::new(canvas));
        let latch = Arc::new(DrawLatch::new(frames.len()));
        let failure: Arc<Mutex<Option<StripError>>> = Arc::new(Mutex::new(None));

        let mut tasks = Vec::with_capacity(frames.len());
        for (frame, cell) in frames.iter().cloned().zip(plan.cells.iter().copied()) {
            let decoder = Arc::clone(&self.decoder);
            let canvas = Arc::clone(&canvas);
            let failure = Arc::clone(&failure);
            let guard = CountDownGuard::new(Arc::clone(&latch));
            let canvas_width = plan.canvas_width;

            tasks.push(tokio::task::spawn_blocking(move || {
                let _guard = guard;
                let drawn =
                    draw_cell(decoder.as_ref(), &frame, cell, treatment, canvas_width, &canvas);
                match drawn {
                    Ok(()) => debug!("frame #{} drawn", frame.index),
                    Err(e) => record_first(&failure, e),
                }
            }));
        }

        latch.wait().await;

        for task in tasks {
            if let Err(e) = task.await {
                record_first(&failure, StripError::Render(format!("draw task failed: {e}")));
            }
        }
        if let Some(e) = failure.lock().take() {
            return Err(e);
        }

        let canvas = Arc::try_unwrap(canvas)
            .map_err(|_| StripError::Render("canvas still shared after draw".to_string()))?
            .into_inner();
        let pixels = to_rgba(canvas)?;

        let cells = plan
            .cells
            .iter()
            .map(|rect| StripCell {
                label: rect.label(),
                rect: *rect,
            })
            .collect();

        Ok(StripArtifact {
            width: plan.canvas_width,
            height: plan.canvas_height,
            treatment,
            cells,
            pixels,
        })
    }
}

fn record_first(slot: &Mutex<Option<StripError>>, e: StripError) {
    let mut slot = slot.lock();
    if slot.is_none() {
        *slot = Some(e);
    }
}

/// Exactly `SHOT_COUNT` frames, indexed `1..=SHOT_COUNT` in order.
fn check_frames(frames: &[RawFrame]) -> Result<()> {
    if frames.len() != SHOT_COUNT {
        return Err(StripError::FrameCount {
            expected: SHOT_COUNT,
            actual: frames.len(),
        });
    }
    for (position, frame) in frames.iter().enumerate() {
        if frame.index != position + 1 {
            return Err(StripError::FrameOrder {
                position: position + 1,
                index: frame.index,
            });
        }
    }
    Ok(())
}

/// Background fill and the inset border stroke.
fn paint_frame(canvas: &mut tiny_skia::Pixmap, plan: &CompositeLayout) -> Result<()> {
    let (r, g, b) = BACKGROUND;
    canvas.fill(tiny_skia::Color::from_rgba8(r, g, b, 255));

    let rect = tiny_skia::Rect::from_xywh(
        BORDER_INSET,
        BORDER_INSET,
        plan.canvas_width as f32 - 2.0 * BORDER_INSET,
        plan.canvas_height as f32 - 2.0 * BORDER_INSET,
    )
    .ok_or_else(|| StripError::Render("canvas too small for border".to_string()))?;
    let path = tiny_skia::PathBuilder::from_rect(rect);

    let mut paint = tiny_skia::Paint::default();
    paint.set_color_rgba8(255, 255, 255, 255);
    paint.anti_alias = false;
    let stroke = tiny_skia::Stroke {
        width: BORDER_WIDTH,
        ..tiny_skia::Stroke::default()
    };
    canvas.stroke_path(
        &path,
        &paint,
        &stroke,
        tiny_skia::Transform::identity(),
        None,
    );
    Ok(())
}

/// Decode, scale, treat, then draw one frame and its label.
fn draw_cell(
    decoder: &dyn FrameDecoder,
    frame: &RawFrame,
    cell: CellRect,
    treatment: Treatment,
    canvas_width: u32,
    canvas: &Mutex<tiny_skia::Pixmap>,
) -> Result<()> {
    let decoded = decoder.decode(frame).map_err(|reason| StripError::Decode {
        index: frame.index,
        reason,
    })?;
    let mut photo = codec::stretch_rgba(&decoded, cell.width, cell.height)
        .map_err(StripError::Render)?;
    treatment.apply(&mut photo);
    let photo = to_pixmap(photo)?;

    let mut canvas = canvas.lock();
    canvas.draw_pixmap(
        cell.x as i32,
        cell.y as i32,
        photo.as_ref(),
        &tiny_skia::PixmapPaint::default(),
        tiny_skia::Transform::identity(),
        None,
    );
    text::draw_best_effort(
        &mut canvas,
        &[text::label_run(cell.label(), cell.label_anchor(canvas_width))],
    );
    Ok(())
}

fn to_pixmap(img: RgbaImage) -> Result<tiny_skia::Pixmap> {
    let (w, h) = img.dimensions();
    let mut data = img.into_raw();
    // tiny-skia stores premultiplied alpha
    for px in data.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a < 255 {
            for c in &mut px[..3] {
                *c = ((u16::from(*c) * a + 127) / 255) as u8;
            }
        }
    }
    let size = tiny_skia::IntSize::from_wh(w, h)
        .ok_or_else(|| StripError::Render("photo has zero size".to_string()))?;
    tiny_skia::Pixmap::from_vec(data, size)
        .ok_or_else(|| StripError::Render("photo buffer size mismatch".to_string()))
}

fn to_rgba(canvas: tiny_skia::Pixmap) -> Result<RgbaImage> {
    let (w, h) = (canvas.width(), canvas.height());
    let mut data = Vec::with_capacity((w * h * 4) as usize);
    for px in canvas.pixels() {
        let c = px.demultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    RgbaImage::from_raw(w, h, data)
        .ok_or_else(|| StripError::Render("strip buffer size mismatch".to_string()))
}
