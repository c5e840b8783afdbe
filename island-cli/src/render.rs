//! Plain-text drawing of the mounted surfaces.

use island_core::{display::STYLE_ID, view::Element};

/// Draws every surface under `container`, one block per surface.
pub fn draw(container: &Element) -> String {
    let mut out = String::new();
    for surface in container.children() {
        if surface.id().as_deref() == Some(STYLE_ID) {
            continue;
        }
        out.push_str(&format!("[{}]\n", surface.name()));
        draw_node(&surface, 1, &mut out);
    }
    out
}

fn draw_node(element: &Element, depth: usize, out: &mut String) {
    for child in element.children() {
        let text = child.text();
        if text.is_empty() {
            draw_node(&child, depth, out);
        } else {
            out.push_str(&"  ".repeat(depth));
            out.push_str(&text);
            out.push('\n');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use island_core::{Config, display::DisplayController, model::Payload, parser::parse};

    #[test]
    fn draws_text_leaves_and_skips_style() {
        let body = Element::new("body");
        let display = DisplayController::mount(&body, &Config::default());
        let record = parse(&Payload::error("无法获取位置信息"), 0, "", None, Default::default());
        display.render(&record);

        let drawn = draw(&body);

        assert!(drawn.starts_with("[circular-weather-widget]\n"));
        assert!(drawn.contains("[weather-bar]"));
        assert!(drawn.contains("  无法获取位置信息\n"));
        assert!(drawn.contains("未知位置"));
        assert!(!drawn.contains("theme"));
    }
}
