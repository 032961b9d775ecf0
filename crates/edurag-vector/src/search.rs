use arrow_array::{Array, Float32Array, Int64Array, RecordBatch, StringArray};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::{DistanceType, Table};

use edurag_core::types::RetrievedChunk;

use crate::error::{Result, StoreError};

fn column<'a, T: Array + 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<T>())
        .ok_or_else(|| StoreError::MissingColumn(name.to_string()))
}

fn position_at(col: &Int64Array, i: usize) -> usize {
    usize::try_from(col.value(i)).unwrap_or_default()
}

/// Exhaustive L2 scan. `_distance` is the squared Euclidean distance.
pub async fn nearest(table: &Table, query: &[f32], k: usize) -> Result<Vec<RetrievedChunk>> {
    let mut stream = table
        .vector_search(query.to_vec())?
        .distance_type(DistanceType::L2)
        .limit(k)
        .execute()
        .await?;

    let mut hits = Vec::with_capacity(k);
    while let Some(batch) = stream.try_next().await? {
        let positions = column::<Int64Array>(&batch, "position")?;
        let sources = column::<StringArray>(&batch, "source")?;
        let texts = column::<StringArray>(&batch, "text")?;
        let distances = column::<Float32Array>(&batch, "_distance")?;
        for i in 0..batch.num_rows() {
            hits.push(RetrievedChunk {
                position: position_at(positions, i),
                source: sources.value(i).to_string(),
                text: texts.value(i).to_string(),
                distance: distances.value(i),
            });
        }
    }
    // Ties resolve to the earlier insertion.
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.position.cmp(&b.position)));
    hits.truncate(k);
    Ok(hits)
}

/// All `(position, source, text)` rows in insertion order.
pub async fn scan_rows(table: &Table, count: usize) -> Result<Vec<(usize, String, String)>> {
    let mut stream = table
        .query()
        .select(Select::columns(&["position", "source", "text"]))
        .limit(count)
        .execute()
        .await?;

    let mut rows = Vec::with_capacity(count);
    while let Some(batch) = stream.try_next().await? {
        let positions = column::<Int64Array>(&batch, "position")?;
        let sources = column::<StringArray>(&batch, "source")?;
        let texts = column::<StringArray>(&batch, "text")?;
        for i in 0..batch.num_rows() {
            rows.push((position_at(positions, i), sources.value(i).to_string(), texts.value(i).to_string()));
        }
    }
    rows.sort_by_key(|(p, _, _)| *p);
    Ok(rows)
}
