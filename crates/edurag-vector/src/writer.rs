use arrow_array::types::Float32Type;
use arrow_array::{FixedSizeListArray, Int64Array, RecordBatch, RecordBatchIterator, StringArray};
use lancedb::{Connection, Table};
use std::sync::Arc;

use edurag_core::types::Chunk;

use crate::error::{Result, StoreError};
use crate::schema::build_chunk_schema;

/// Rows for `chunks`, numbered from `start`. Callers check lengths and widths first.
pub fn chunk_batch(width: i32, start: usize, vectors: &[Vec<f32>], chunks: &[Chunk]) -> Result<RecordBatch> {
    if vectors.len() != chunks.len() {
        return Err(StoreError::LengthMismatch { vectors: vectors.len(), chunks: chunks.len() });
    }
    let positions: Vec<i64> = (start..start + chunks.len()).map(|p| i64::try_from(p).unwrap_or(i64::MAX)).collect();
    let sources: Vec<&str> = chunks.iter().map(|c| c.source.as_str()).collect();
    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    let vectors = FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(
        vectors.iter().map(|v| Some(v.iter().copied().map(Some))),
        width,
    );

    Ok(RecordBatch::try_new(
        build_chunk_schema(width),
        vec![
            Arc::new(Int64Array::from(positions)),
            Arc::new(StringArray::from(sources)),
            Arc::new(StringArray::from(texts)),
            Arc::new(vectors),
        ],
    )?)
}

/// Create a version table holding `batch` (or no rows) in one commit.
pub async fn create_table(db: &Connection, name: &str, width: i32, batch: Option<RecordBatch>) -> Result<Table> {
    let schema = build_chunk_schema(width);
    let table = match batch {
        Some(batch) => {
            let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
            db.create_table(name, reader).execute().await?
        }
        None => db.create_empty_table(name, schema).execute().await?,
    };
    Ok(table)
}

/// Append `batch` as a single commit: every row lands or none does.
pub async fn append(table: &Table, batch: RecordBatch) -> Result<()> {
    let schema = batch.schema();
    let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
    table.add(reader).execute().await?;
    Ok(())
}
