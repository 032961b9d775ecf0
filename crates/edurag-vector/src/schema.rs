use arrow_schema::{DataType, Field, Schema, SchemaRef};
use std::sync::Arc;

/// Output width of all-MiniLM-L6-v2.
pub const EMBEDDING_DIM: i32 = 384;

/// One row per chunk: text and vector travel together so a single commit
/// always carries both halves of the pair.
pub fn build_chunk_schema(dim: i32) -> SchemaRef {
	Arc::new(Schema::new(vec![
		Field::new("position", DataType::Int64, false),
		Field::new("source", DataType::Utf8, false),
		Field::new("text", DataType::Utf8, false),
		Field::new("vector", DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
	]))
}

/// Width of the `vector` column, if the schema has one.
pub fn vector_dim(schema: &Schema) -> Option<usize> {
	match schema.field_with_name("vector").ok()?.data_type() {
		DataType::FixedSizeList(_, n) => usize::try_from(*n).ok(),
		_ => None,
	}
}
