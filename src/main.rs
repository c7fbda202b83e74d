use avsplus_dec::decoder::{Decoder, DecoderConfig};
use clap::Parser;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Feeds an AVS+ elementary stream through the decoder and dumps each
/// decoded picture's planes as raw planar YUV.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to a raw AVS+ elementary stream (start-code delimited).
    input: PathBuf,

    /// Directory to write one `picNNNNN.yuv` file per decoded picture.
    #[arg(short, long)]
    out_dir: PathBuf,

    /// Output pictures in encoded order instead of display order.
    #[arg(long)]
    encoded_order: bool,

    #[arg(long)]
    disable_loop_filter: bool,
}

fn write_picture(out_dir: &PathBuf, index: usize, pic: &avsplus_dec::pipeline::DecodedPicture) -> std::io::Result<()> {
    let path = out_dir.join(format!("pic{index:05}.yuv"));
    let mut f = fs::File::create(path)?;
    for plane_idx in 0..3 {
        let plane = pic.frame.plane(plane_idx);
        for y in 0..plane.height as i32 {
            f.write_all(plane.row(y))?;
        }
    }
    Ok(())
}

fn main() -> avsplus_dec::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();
    fs::create_dir_all(&args.out_dir).map_err(|_| avsplus_dec::Error::OutOfMemory)?;

    let data = fs::read(&args.input).map_err(|_| avsplus_dec::Error::bad_stream("cannot read input file"))?;

    let config = DecoderConfig {
        output_encoded_order: args.encoded_order,
        thread_cnt: 0,
        disable_loop_filter: args.disable_loop_filter,
    };
    let mut decoder = Decoder::create(config);

    let mut count = 0usize;
    let pics = decoder.feed(&data)?;
    for pic in pics {
        write_picture(&args.out_dir, count, &pic).map_err(|_| avsplus_dec::Error::OutOfMemory)?;
        count += 1;
    }
    for pic in decoder.flush() {
        write_picture(&args.out_dir, count, &pic).map_err(|_| avsplus_dec::Error::OutOfMemory)?;
        count += 1;
    }

    if let Some(info) = decoder.get_info() {
        tracing::info!(width = info.width, height = info.height, profile = info.profile, "stream decoded, {} pictures", count);
    }

    Ok(())
}
