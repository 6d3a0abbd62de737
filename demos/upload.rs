// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Uploads a file in chunks and, once Twitter is done processing it, tweets it.

use std::path::PathBuf;
use std::time::Duration;

use fledgling::media::{media_types, ChunkedUpload, MediaHandle, ProcessingInfo};
use fledgling::{Config, Options, Twitter};
use structopt::StructOpt;
use yansi::Paint;

#[derive(StructOpt)]
struct Args {
    /// The file to upload
    #[structopt(parse(from_os_str))]
    path: PathBuf,
    /// Text of the tweet to attach the media to
    #[structopt(long)]
    text: Option<String>,
    /// Alt text for the media
    #[structopt(long)]
    alt_text: Option<String>,
    /// Size of each uploaded segment, in bytes
    #[structopt(long)]
    chunk_size: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::from_args();
    let twitter = Twitter::new(Config::from_env());

    let typ = match args.path.extension().and_then(|os| os.to_str()).unwrap_or("") {
        "jpg" | "jpeg" => media_types::image_jpg(),
        "gif" => media_types::image_gif(),
        "png" => media_types::image_png(),
        "webp" => media_types::image_webp(),
        "mp4" => media_types::video_mp4(),
        _ => {
            eprintln!("Format not recognized, must be one of [jpg, jpeg, gif, png, webp, mp4]");
            std::process::exit(1);
        }
    };

    let mut upload = ChunkedUpload::new(&args.path, typ.to_string());
    if let Some(size) = args.chunk_size {
        upload = upload.chunk_size(size);
    }

    println!("Uploading '{}' as {}", args.path.display(), upload.category());
    let finalized = twitter.media().upload(&mut upload).await?;
    if !finalized.is_success() {
        eprintln!("{} {}", Paint::red("FINALIZE failed:"), finalized.raw_body().unwrap_or_default());
        std::process::exit(1);
    }
    println!("Sent {} segments", upload.segment_index());

    let mut handle: MediaHandle = finalized.decode()?;
    loop {
        match &handle.processing {
            None | Some(ProcessingInfo::Succeeded) => break,
            Some(ProcessingInfo::Failed(err)) => {
                eprintln!("{} {}", Paint::red("Processing failed:"), err.message);
                std::process::exit(1);
            }
            Some(ProcessingInfo::Pending { check_after })
            | Some(ProcessingInfo::InProgress { check_after, .. }) => {
                println!("Processing, checking again in {}s", check_after);
                tokio::time::sleep(Duration::from_secs(*check_after)).await;
                handle = twitter.media().status(&handle.id).await?.decode()?;
            }
        }
    }
    println!("{} media {}", Paint::green("Ready:"), handle.id);

    if let Some(alt) = &args.alt_text {
        twitter.media().set_alt_text(&handle.id, alt).await?;
    }

    if let Some(text) = &args.text {
        let opts = Options::new().set("media_ids", handle.id.clone());
        let resp = twitter.statuses().update(text, Some(&opts)).await?;
        let id = resp.get("id_str").and_then(|s| s.as_str()).unwrap_or("?");
        println!("{} tweet {}", Paint::green("Posted"), id);
    }

    Ok(())
}
