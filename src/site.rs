//! Whole-export build: index page plus one page per channel

use crate::config::ExportConfig;
use crate::error::Result;
use crate::export::ExportDir;
use crate::logging::{Timer, log_error};
use crate::metadata::Directory;
use crate::render::{ChannelAssembler, MessageRenderer, PageStats, render_channel_page, render_index};
use crate::storage::{ArchiveStats, Fetch, FileArchiver, Workspace};
use futures::StreamExt;

/// Totals for the end-of-run log line
#[derive(Debug, Default, Clone)]
pub struct SiteSummary {
    pub channels_written: usize,
    pub channels_failed: usize,
    pub messages: PageStats,
    pub files: ArchiveStats,
}

pub struct Site<F> {
    config: ExportConfig,
    export: ExportDir,
    workspace: Workspace,
    directory: Directory,
    archiver: FileArchiver<F>,
}

impl<F: Fetch> Site<F> {
    /// Load the workspace directory; a missing or broken manifest is fatal
    pub async fn load(config: ExportConfig, fetcher: F) -> Result<Self> {
        let export = ExportDir::new(&config.input_dir);
        let workspace = Workspace::new(&config.output_dir);
        let directory = Directory::load(&export).await?;
        let archiver = FileArchiver::new(workspace.media_dir(), fetcher);

        Ok(Self {
            config,
            export,
            workspace,
            directory,
            archiver,
        })
    }

    /// Write the index and every channel page
    ///
    /// Only failures to prepare the output tree or write the index abort the
    /// build; a channel that fails is logged and the others continue.
    pub async fn build(&self) -> Result<SiteSummary> {
        let _timer = Timer::new("build_site");
        self.workspace.ensure_workspace().await?;

        let names: Vec<&str> = self
            .directory
            .channels()
            .sorted_names()
            .into_iter()
            .filter(|name| {
                let usable = usable_channel_name(name);
                if !usable {
                    tracing::warn!(channel = %name, "Unusable channel name, skipping channel");
                }
                usable
            })
            .collect();
        let index = render_index(&self.config.title, &names);
        self.workspace
            .write_page(&self.workspace.index_path(), &index)
            .await?;
        tracing::info!(channels = names.len(), "Index written");

        let results: Vec<_> = futures::stream::iter(names.iter().copied())
            .map(|name| async move { (name, self.build_channel(name).await) })
            .buffered(self.config.concurrency)
            .collect()
            .await;

        let mut summary = SiteSummary::default();
        for (name, result) in results {
            match result {
                Ok(stats) => {
                    summary.channels_written += 1;
                    summary.messages.rendered += stats.rendered;
                    summary.messages.skipped += stats.skipped;
                    summary.messages.diagnostics += stats.diagnostics;
                    summary.messages.batch_files += stats.batch_files;
                }
                Err(e) => {
                    summary.channels_failed += 1;
                    tracing::error!(channel = %name, "Channel page not written");
                    log_error("build_channel", &e);
                }
            }
        }
        summary.files = self.archiver.stats().await;

        tracing::info!(
            channels_written = summary.channels_written,
            channels_failed = summary.channels_failed,
            messages_rendered = summary.messages.rendered,
            messages_skipped = summary.messages.skipped,
            unknown_elements = summary.messages.diagnostics,
            files_fetched = summary.files.fetched,
            files_cached = summary.files.cache_hits,
            fetch_failures = summary.files.failures,
            "Export rendered"
        );

        Ok(summary)
    }

    async fn build_channel(&self, name: &str) -> Result<PageStats> {
        let timer = Timer::new(format!("build_channel:{name}"));
        let batch_files = self.export.batch_files(name).await?;

        let assembler =
            ChannelAssembler::new(MessageRenderer::new(&self.directory, &self.archiver));
        let page = assembler.assemble(name, &batch_files).await?;

        let html = render_channel_page(&self.config.title, name, &page.body);
        self.workspace
            .write_page(&self.workspace.channel_page_path(name), &html)
            .await?;

        tracing::info!(
            channel = %name,
            batch_files = page.stats.batch_files,
            messages = page.stats.rendered,
            skipped = page.stats.skipped,
            duration_ms = timer.elapsed_ms(),
            "Channel page written"
        );

        Ok(page.stats)
    }
}

/// Channel names become file names in both the input and output trees
fn usable_channel_name(name: &str) -> bool {
    !(name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\', '\0']))
}
