// Command implementations, kept apart from argument parsing

use anafi_eye::{Detection, EyeConfig, OverlayItem, OverlayRenderer, Size};
use anyhow::{anyhow, Context};
use image::imageops::FilterType;
use std::path::Path;
use tracing::info;

pub fn load_config(path: Option<&Path>) -> anyhow::Result<EyeConfig> {
    let config = match path {
        Some(path) => EyeConfig::from_file(path).with_context(|| format!("loading config {}", path.display()))?,
        None => EyeConfig::from_env(),
    };
    config.validate().map_err(|e| anyhow!("invalid configuration: {}", e))?;
    Ok(config)
}

pub fn load_detections(path: &Path) -> anyhow::Result<Vec<Detection>> {
    let content = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let detections: Vec<Detection> =
        serde_json::from_str(&content).with_context(|| format!("parsing detections from {}", path.display()))?;
    info!("Loaded {} detection(s) from {}", detections.len(), path.display());
    Ok(detections)
}

pub fn project(config: &EyeConfig, detections: &Path, source: Size, viewport: Size) -> anyhow::Result<Vec<OverlayItem>> {
    let detections = load_detections(detections)?;
    let (measure, _) = config.build_measure()?;
    let items = config.projector(measure).project(&detections, source, viewport)?;
    Ok(items)
}

/// Paint `detections` onto `image`, optionally resized to `viewport`, and
/// save the result. Returns how many overlays were painted.
pub fn render(
    config: &EyeConfig,
    image: &Path,
    detections: &Path,
    output: &Path,
    viewport: Option<Size>,
    border_width: u32,
) -> anyhow::Result<usize> {
    let detections = load_detections(detections)?;
    let frame = image::open(image)
        .with_context(|| format!("opening {}", image.display()))?
        .to_rgba8();
    let source = Size::from(frame.dimensions());

    let mut frame = match viewport {
        Some(viewport) => {
            let width = viewport.width.round() as u32;
            let height = viewport.height.round() as u32;
            image::imageops::resize(&frame, width.max(1), height.max(1), FilterType::Triangle)
        }
        None => frame,
    };
    let viewport = Size::from(frame.dimensions());

    let (measure, font) = config.build_measure()?;
    let items = config.projector(measure).project(&detections, source, viewport)?;

    let renderer = OverlayRenderer::new(font, config.label_font).with_border_width(border_width);
    let painted = renderer.paint(&mut frame, &items);
    frame.save(output).with_context(|| format!("writing {}", output.display()))?;
    info!("Wrote {}x{} frame to {}", frame.width(), frame.height(), output.display());
    Ok(painted)
}
