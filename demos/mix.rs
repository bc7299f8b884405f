//! Composites several RTMP streams with `videomixer`.
//!
//! Usage:
//!   cargo run --example mix -- --layout pip \
//!       --source rtmp://192.168.1.124:1935/yanked/rabbit \
//!       --source rtmp://192.168.1.124:1935/yanked/sintel
//!
//!   # publish the result instead of opening a window
//!   cargo run --example mix -- --layout quad --output rtmp://host/app/mixed
//!
//!   # layouts can also be loaded from JSON, print a preset to start from
//!   cargo run --example mix -- --layout judge --print-layout > judge.json
//!   cargo run --example mix -- --layout judge.json

use anyhow::Context;
use clap::Parser;
use gstrtmpmix::common::rtmp_url;
use gstrtmpmix::layout::MixerLayout;
use gstrtmpmix::mixer::{MixerPipeline, Output};

mod common;

#[derive(Parser, Debug)]
struct MixParams {
    /// Preset (single, pip, split, quad, judge) or path to a JSON layout
    #[clap(short, long, default_value = "pip")]
    layout: String,

    /// RTMP input per tile, in tile order. Defaults to one stream per tile
    /// label on the default server.
    #[clap(short, long)]
    source: Vec<String>,

    /// `display` or an rtmp:// location to publish to
    #[clap(short, long, default_value = "display")]
    output: String,

    /// Print the layout as JSON and exit
    #[clap(long)]
    print_layout: bool,
}

fn load_layout(layout: &str) -> anyhow::Result<MixerLayout> {
    if let Some(preset) = MixerLayout::preset(layout) {
        return Ok(preset);
    }
    let json = std::fs::read_to_string(layout).with_context(|| {
        format!(
            "'{}' is neither a preset ({}) nor a readable layout file",
            layout,
            MixerLayout::PRESETS.join(", ")
        )
    })?;
    Ok(MixerLayout::from_json(&json)?)
}

fn example_main() -> anyhow::Result<()> {
    let args = MixParams::parse();
    let layout = load_layout(&args.layout)?;

    if args.print_layout {
        println!("{}", layout.to_json()?);
        return Ok(());
    }

    common::init()?;

    let sources = if args.source.is_empty() {
        layout.tiles.iter().map(|tile| rtmp_url(&tile.label)).collect()
    } else {
        args.source
    };

    let mixer = MixerPipeline::build(&layout, &sources, &Output::parse(&args.output))?;
    println!("Mixing {} streams with layout '{}'", sources.len(), layout.name);
    mixer.run()?;
    Ok(())
}

fn main() {
    common::main_with(example_main);
}
