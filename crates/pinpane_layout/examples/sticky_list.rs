//! Sticky section headers over a long list
//!
//! Run with:
//! `RUST_LOG=pinpane_layout=trace cargo run -p pinpane_layout --example sticky_list`
//!
//! Optional:
//! - Set `PINPANE_CONFIG` to a TOML file to override the pane configuration

use std::sync::Arc;
use std::time::{Duration, Instant};

use pinpane_layout::prelude::*;
use tracing_subscriber::EnvFilter;

const SECTIONS: usize = 4;
const ROWS_PER_SECTION: usize = 6;
const ROW_HEIGHT: f32 = 24.0;
const HEADER_HEIGHT: f32 = 32.0;

fn load_config() -> StickyPaneConfig {
    let Ok(path) = std::env::var("PINPANE_CONFIG") else {
        return StickyPaneConfig::default().viewport(360.0, 240.0);
    };
    match std::fs::read_to_string(&path)
        .map_err(|err| err.to_string())
        .and_then(|source| StickyPaneConfig::from_toml_str(&source).map_err(|err| err.to_string()))
    {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("ignoring {path}: {err}");
            StickyPaneConfig::default().viewport(360.0, 240.0)
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let pane = StickyPane::new(load_config());
    pane.mount()?;
    let content = pane.content().expect("pane is mounted");
    let context = pane.context();

    let mut headers = Vec::new();
    for _ in 0..SECTIONS {
        let header = {
            let mut tree = pane.tree().lock().unwrap();
            let header = StickyBox::new(HEADER_HEIGHT)
                .sticky_top()
                .build(&mut tree, content)?;
            for _ in 0..ROWS_PER_SECTION {
                let row = tree.create_node(LayoutStyle::fixed_height(ROW_HEIGHT))?;
                tree.add_child(content, row)?;
            }
            header
        };
        headers.push((Arc::clone(&header), mount_sticky(&context, header)));
    }

    let footer = {
        let mut tree = pane.tree().lock().unwrap();
        StickyBox::new(HEADER_HEIGHT)
            .sticky_bottom()
            .build(&mut tree, content)?
    };
    let _footer = mount_sticky(&context, Arc::clone(&footer));

    let start = Instant::now();
    let throttle = Duration::from_millis(pane.config().scroll_throttle_ms);
    for step in 0..=10u32 {
        let offset = step as f32 * 60.0;
        pane.on_scroll_at(offset, start + throttle * step);

        let pinned: Vec<usize> = headers
            .iter()
            .enumerate()
            .filter(|(_, (header, _))| header.lock().unwrap().pin_state() == PinState::PinnedTop)
            .map(|(i, _)| i)
            .collect();
        let layout = pane.layout();
        println!(
            "scroll {offset:>5.0}  pinned headers {pinned:?}  footer {:?}  top {:.0}  bottom {:.0}",
            footer.lock().unwrap().pin_state(),
            layout.sticky_top_height,
            layout.sticky_bottom_height,
        );
    }

    for (_, mount) in headers {
        mount.unmount();
    }
    pane.unmount();
    Ok(())
}
