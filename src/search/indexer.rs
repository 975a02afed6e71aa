use crate::config::{DEFAULT_CHUNK_SIZE, DEFAULT_FLUSH_THRESHOLD};
use crate::models::{ImageRow, TagRow};
use crate::search::documents::{ImageDocument, map_image};
use crate::search::error::SearchError;
use crate::search::service::SearchService;
use log::{debug, info, warn};
use sqlx::PgPool;

#[derive(Debug, Clone)]
pub struct ReindexOptions {
    /// Page size for the keyset scan over the images table.
    pub chunk_size: i64,
    /// Buffered document count that triggers a bulk write.
    pub flush_threshold: usize,
    /// Skip the per-record tag lookup. This is the high-volume path: the
    /// documents come out tag-incomplete but the scan avoids one query per
    /// image.
    pub defer_tags: bool,
}

impl Default for ReindexOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE as i64,
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
            defer_tags: true,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReindexSummary {
    /// Documents accepted by the engine.
    pub indexed: usize,
    /// Documents rejected per-item by the engine.
    pub failed: usize,
    /// Records skipped before mapping (failed tag lookup).
    pub skipped: usize,
}

/// Reindexes every image in the database. Pages through the images table in
/// id order so memory stays bounded by the chunk size, maps each row to a
/// search document, and pushes documents through a flush buffer that issues
/// one bulk write per full batch plus a mandatory tail flush.
///
/// Writes are idempotent by identifier, so a rerun after a failure simply
/// starts the scan over; batches flushed before the failure stay indexed.
pub async fn reindex_images(
    pool: &PgPool,
    search: &SearchService,
    options: &ReindexOptions,
) -> Result<ReindexSummary, SearchError> {
    search.ensure_image_index().await?;

    let mut buffer = FlushBuffer::new(options.flush_threshold);
    let mut summary = ReindexSummary::default();
    let mut last_id: i32 = 0;

    loop {
        let rows: Vec<ImageRow> = sqlx::query_as::<_, ImageRow>(IMAGE_QUERY)
            .bind(last_id)
            .bind(options.chunk_size)
            .fetch_all(pool)
            .await
            .map_err(SearchError::Database)?;

        if rows.is_empty() {
            break;
        }

        debug!(
            "reindex_images: processing chunk ({} images, id range {}-{})",
            rows.len(),
            rows.first().map(|row| row.id).unwrap_or_default(),
            rows.last().map(|row| row.id).unwrap_or_default()
        );

        for row in &rows {
            let tags = if options.defer_tags {
                None
            } else {
                match fetch_tags(pool, row.id).await {
                    Ok(names) => Some(names),
                    Err(err) => {
                        warn!(
                            "skipping image {}: failed to load tags: {}",
                            row.identifier, err
                        );
                        summary.skipped += 1;
                        continue;
                    }
                }
            };

            debug!("indexing database record {}", row.identifier);
            let document = map_image(row, tags.as_deref());
            if let Some(batch) = buffer.push(document) {
                flush_batch(search, batch, &mut summary).await?;
            }
        }

        last_id = rows.last().map(|row| row.id).unwrap_or(last_id);
    }

    // The tail flush is mandatory: dropping it would silently lose the
    // final partial batch. An empty buffer performs no network call.
    if let Some(batch) = buffer.finish() {
        flush_batch(search, batch, &mut summary).await?;
    }

    info!(
        "reindex_images: {} documents indexed, {} rejected, {} skipped",
        summary.indexed, summary.failed, summary.skipped
    );

    Ok(summary)
}

async fn flush_batch(
    search: &SearchService,
    batch: Vec<ImageDocument>,
    summary: &mut ReindexSummary,
) -> Result<(), SearchError> {
    debug!("pushing batch of {} documents to the index", batch.len());

    let report = search.bulk_index(&batch).await?;
    summary.indexed += report.indexed;
    summary.failed += report.failures.len();

    for failure in &report.failures {
        warn!(
            "document {} rejected by the index (status {}): {}",
            failure.identifier, failure.status, failure.reason
        );
    }

    Ok(())
}

async fn fetch_tags(pool: &PgPool, image_id: i32) -> Result<Vec<String>, sqlx::Error> {
    let rows: Vec<TagRow> = sqlx::query_as::<_, TagRow>(TAG_QUERY)
        .bind(image_id)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(|row| row.name).collect())
}

/// Accumulates mapped documents and hands back a full batch exactly when the
/// buffer reaches the threshold. The batch is moved out whole; the buffer is
/// empty afterwards and is never shared with callers across pushes.
pub struct FlushBuffer {
    threshold: usize,
    buffer: Vec<ImageDocument>,
}

impl FlushBuffer {
    pub fn new(threshold: usize) -> Self {
        let threshold = threshold.max(1);
        Self {
            threshold,
            buffer: Vec::with_capacity(threshold),
        }
    }

    /// Appends a document. Returns the accumulated batch once the buffer
    /// holds exactly `threshold` documents.
    pub fn push(&mut self, document: ImageDocument) -> Option<Vec<ImageDocument>> {
        self.buffer.push(document);
        if self.buffer.len() >= self.threshold {
            Some(std::mem::take(&mut self.buffer))
        } else {
            None
        }
    }

    /// Hands back whatever remains below the threshold. `None` when nothing
    /// is buffered, so an empty tail never turns into a bulk call.
    pub fn finish(&mut self) -> Option<Vec<ImageDocument>> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.buffer))
        }
    }
}

const IMAGE_QUERY: &str = r#"
    SELECT
        id,
        identifier,
        title,
        creator,
        creator_url,
        url,
        provider,
        source,
        license,
        foreign_landing_url,
        created_on
    FROM images
    WHERE id > $1
    ORDER BY id
    LIMIT $2
"#;

const TAG_QUERY: &str = r#"
    SELECT t.name
    FROM tags t
    JOIN image_tags it ON it.tag_id = t.id
    WHERE it.image_id = $1
"#;
