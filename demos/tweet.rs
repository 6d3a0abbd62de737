// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Posts a tweet, or with `--dry-run` just shows who would post it.
//!
//! Credentials come from the `TWITTER_CONSUMER_KEY`, `TWITTER_CONSUMER_SECRET`,
//! `TWITTER_ACCESS_KEY` and `TWITTER_ACCESS_SECRET` environment variables.

use fledgling::{Config, Options, Twitter};
use structopt::StructOpt;
use yansi::Paint;

#[derive(StructOpt)]
struct Args {
    /// Text of the tweet
    text: String,
    /// Post the tweet as a reply to this one
    #[structopt(long)]
    reply_to: Option<u64>,
    /// Check the credentials and the text without posting
    #[structopt(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::from_args();
    let twitter = Twitter::new(Config::from_env());

    let me = twitter.verify_tokens().await?;
    if !me.is_success() {
        eprintln!("{} {}", Paint::red("Credentials rejected:"), me.raw_body().unwrap_or_default());
        std::process::exit(1);
    }
    let screen_name = me
        .get("screen_name")
        .and_then(|s| s.as_str())
        .unwrap_or("(unknown)");
    println!("Signed in as {}", Paint::cyan(format!("@{}", screen_name)));

    fledgling::tweet::validate_status_text(&args.text, twitter.config().max_status_length)?;
    if args.dry_run {
        println!("Would post: {}", args.text);
        return Ok(());
    }

    let mut opts = Options::new();
    if let Some(id) = args.reply_to {
        opts = opts
            .set("in_reply_to_status_id", id)
            .set("auto_populate_reply_metadata", true);
    }

    let resp = twitter.statuses().update(&args.text, Some(&opts)).await?;
    if resp.is_success() {
        let id = resp.get("id_str").and_then(|s| s.as_str()).unwrap_or("?");
        println!("{} https://twitter.com/{}/status/{}", Paint::green("Posted"), screen_name, id);
    } else {
        for err in resp.errors()? {
            eprintln!("{} {}", Paint::red("Twitter said:"), err);
        }
    }

    if let Some(rate) = resp.rate_limit() {
        println!("{}", Paint::new(rate).dimmed());
    }

    Ok(())
}
