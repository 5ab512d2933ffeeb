use anyhow::{Context, Result};
use reqwest::Url;
use splitget_fetch::{RangeFetcher, ReqwestClient, ensure_absent, write_output};
use tracing::info;

use super::app::App;
use crate::runtime;
use crate::ui::{self, tracker::progress_callback};

const USER_AGENT: &str = concat!("splitget/", env!("CARGO_PKG_VERSION"));

/// Download `app.url` into `app.output_file`.
///
/// Usage problems (no URL, unparsable URL, existing output) are reported
/// before any request is sent. The output file only appears once every
/// chunk has arrived.
pub fn run(app: App) -> Result<()> {
    let url = app.url.as_deref().context("Missing URL argument!")?;
    Url::parse(url).with_context(|| format!("invalid URL {url:?}"))?;
    ensure_absent(&app.output_file)?;

    let tracker = ui::new_tracker(app.bar);
    let options = app
        .fetch_options()
        .on_progress(progress_callback(tracker.clone()));
    let client = ReqwestClient::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(app.connect_timeout())
        .build()
        .context("failed to build HTTP client")?;
    let fetcher = RangeFetcher::new(client).with_options(options);

    let rt = runtime::build().context("failed to start async runtime")?;
    let result = rt.block_on(fetcher.fetch_and_assemble(url, app.chunk_size, app.num_chunks));

    let bytes = match result {
        Ok(bytes) => bytes,
        Err(e) => {
            tracker.finish(None);
            return Err(e).with_context(|| format!("failed to download {url}"));
        }
    };

    write_output(&app.output_file, &bytes)?;
    info!(path = %app.output_file.display(), bytes = bytes.len(), "download complete");
    tracker.finish(Some("Done!"));
    Ok(())
}
