// LanceDB vector database module
// Handles vector storage and similarity search for FAQ embeddings


use super::{FaqMetadata, FaqRecord, QueryOptions, VectorIndex, VectorMatch};
use crate::{FaqError, Result, config::Config};
use arrow::array::{Array, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::{
    Connection, DistanceType, Table,
    query::{ExecutableQuery, QueryBase},
};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

const TABLE_NAME: &str = "faqs";

/// Vector index backed by an embedded LanceDB database
pub struct LanceVectorStore {
    connection: Connection,
    table_name: String,
    // Serializes creation of the table on first upsert
    create_lock: Mutex<()>,
}

impl LanceVectorStore {
    /// Open (or create) the vector database under the configured base directory
    #[inline]
    pub async fn new(config: &Config) -> Result<Self> {
        Self::open(&config.vector_database_path()).await
    }

    /// Open (or create) the vector database at `db_path`
    #[inline]
    pub async fn open(db_path: &Path) -> Result<Self> {
        debug!("Initializing LanceDB at path: {:?}", db_path);

        std::fs::create_dir_all(db_path).map_err(|e| {
            FaqError::Storage(format!("Failed to create vector database directory: {}", e))
        })?;

        let uri = format!("file://{}", db_path.display());
        let connection = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| FaqError::Storage(format!("Failed to connect to LanceDB: {}", e)))?;

        info!("Vector store opened at {}", db_path.display());
        Ok(Self {
            connection,
            table_name: TABLE_NAME.to_string(),
            create_lock: Mutex::new(()),
        })
    }

    async fn table_exists(&self) -> Result<bool> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| FaqError::Storage(format!("Failed to list tables: {}", e)))?;
        Ok(table_names.contains(&self.table_name))
    }

    async fn open_table(&self) -> Result<Table> {
        self.connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| FaqError::Storage(format!("Failed to open table: {}", e)))
    }

    /// Open the FAQ table, creating it with `vector_dim` dimensions if missing
    async fn open_or_create_table(&self, vector_dim: usize) -> Result<Table> {
        let _guard = self.create_lock.lock().await;

        if !self.table_exists().await? {
            info!("Creating FAQ table with {} dimensions", vector_dim);
            self.connection
                .create_empty_table(&self.table_name, create_schema(vector_dim)?)
                .execute()
                .await
                .map_err(|e| FaqError::Storage(format!("Failed to create table: {}", e)))?;
        }

        self.open_table().await
    }

    /// Detect vector dimension from existing table schema
    async fn table_vector_dimension(table: &Table) -> Result<usize> {
        let schema = table
            .schema()
            .await
            .map_err(|e| FaqError::Storage(format!("Failed to get table schema: {}", e)))?;

        schema
            .fields()
            .iter()
            .find(|field| field.name() == "vector")
            .and_then(|field| match field.data_type() {
                DataType::FixedSizeList(_, size) => usize::try_from(*size).ok(),
                _ => None,
            })
            .ok_or_else(|| {
                FaqError::Storage("Could not find vector column or determine dimension".to_string())
            })
    }

    /// Parse search results from LanceDB stream into matches
    async fn parse_search_results_stream(
        mut results: lancedb::arrow::SendableRecordBatchStream,
        return_metadata: bool,
    ) -> Result<Vec<VectorMatch>> {
        let mut matches = Vec::new();

        while let Some(batch) = results
            .try_next()
            .await
            .map_err(|e| FaqError::Storage(format!("Failed to read result stream: {}", e)))?
        {
            matches.extend(parse_search_batch(&batch, return_metadata)?);
        }

        debug!("Parsed {} search results from stream", matches.len());
        Ok(matches)
    }
}

#[async_trait]
impl VectorIndex for LanceVectorStore {
    async fn upsert(&self, records: Vec<FaqRecord>) -> Result<()> {
        let Some(first) = records.first() else {
            debug!("No FAQ records to upsert");
            return Ok(());
        };

        let vector_dim = first.values.len();
        if vector_dim == 0 {
            return Err(FaqError::Storage(
                "Cannot store an empty vector".to_string(),
            ));
        }
        if let Some(record) = records.iter().find(|r| r.values.len() != vector_dim) {
            return Err(FaqError::Storage(format!(
                "Vector dimension mismatch in batch: record {} has {} values, expected {}",
                record.id,
                record.values.len(),
                vector_dim
            )));
        }

        let table = self.open_or_create_table(vector_dim).await?;
        let table_dim = Self::table_vector_dimension(&table).await?;
        if table_dim != vector_dim {
            return Err(FaqError::Storage(format!(
                "Vector dimension mismatch: index expects {} but got {}",
                table_dim, vector_dim
            )));
        }

        let record_batch = create_record_batch(&records, vector_dim)?;
        let schema = record_batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(record_batch)), schema);

        let mut merge_insert = table.merge_insert(&["id"]);
        merge_insert
            .when_matched_update_all(None)
            .when_not_matched_insert_all();
        merge_insert
            .execute(Box::new(reader))
            .await
            .map_err(|e| FaqError::Storage(format!("Failed to upsert FAQ vectors: {}", e)))?;

        info!("Upserted {} FAQ records", records.len());
        Ok(())
    }

    async fn query(&self, vector: &[f32], options: QueryOptions) -> Result<Vec<VectorMatch>> {
        debug!("Searching for similar vectors with limit: {}", options.top_k);

        if !self.table_exists().await? {
            debug!("FAQ table does not exist yet, nothing to search");
            return Ok(Vec::new());
        }

        let table = self.open_table().await?;
        let results = table
            .vector_search(vector)
            .map_err(|e| FaqError::Storage(format!("Failed to create vector search: {}", e)))?
            .column("vector")
            .distance_type(DistanceType::Cosine)
            .limit(options.top_k)
            .execute()
            .await
            .map_err(|e| FaqError::Storage(format!("Failed to execute search: {}", e)))?;

        Self::parse_search_results_stream(results, options.return_metadata).await
    }

    async fn count(&self) -> Result<u64> {
        if !self.table_exists().await? {
            return Ok(0);
        }

        let count = self
            .open_table()
            .await?
            .count_rows(None)
            .await
            .map_err(|e| FaqError::Storage(format!("Failed to count rows: {}", e)))?;

        Ok(count as u64)
    }
}

/// Arrow list size for a vector dimension
fn list_size(vector_dim: usize) -> Result<i32> {
    i32::try_from(vector_dim).map_err(|_| {
        FaqError::Storage(format!(
            "Vector dimension {} exceeds the supported maximum of {}",
            vector_dim,
            i32::MAX
        ))
    })
}

/// Create schema with the specified vector dimension
fn create_schema(vector_dim: usize) -> Result<Arc<Schema>> {
    let size = list_size(vector_dim)?;
    Ok(Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, false)),
                size,
            ),
            false,
        ),
        Field::new("question", DataType::Utf8, true),
        Field::new("answer", DataType::Utf8, true),
        Field::new("created_at", DataType::Utf8, false),
    ])))
}

/// Create a RecordBatch from FAQ records
fn create_record_batch(records: &[FaqRecord], vector_dim: usize) -> Result<RecordBatch> {
    let len = records.len();
    let created_at = chrono::Utc::now().to_rfc3339();

    let mut ids = Vec::with_capacity(len);
    let mut flat_values = Vec::with_capacity(len * vector_dim);
    let mut questions = Vec::with_capacity(len);
    let mut answers = Vec::with_capacity(len);

    for record in records {
        ids.push(record.id.as_str());
        flat_values.extend_from_slice(&record.values);
        questions.push(record.metadata.as_ref().and_then(|m| m.question.as_deref()));
        answers.push(record.metadata.as_ref().and_then(|m| m.answer.as_deref()));
    }

    let values_array = Float32Array::from(flat_values);
    let field = Arc::new(Field::new("item", DataType::Float32, false));
    let vector_array =
        FixedSizeListArray::try_new(field, list_size(vector_dim)?, Arc::new(values_array), None)
            .map_err(|e| FaqError::Storage(format!("Failed to create vector array: {}", e)))?;

    let arrays: Vec<Arc<dyn Array>> = vec![
        Arc::new(StringArray::from(ids)),
        Arc::new(vector_array),
        Arc::new(StringArray::from(questions)),
        Arc::new(StringArray::from(answers)),
        Arc::new(StringArray::from(vec![created_at.as_str(); len])),
    ];

    RecordBatch::try_new(create_schema(vector_dim)?, arrays)
        .map_err(|e| FaqError::Storage(format!("Failed to create record batch: {}", e)))
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| FaqError::Storage(format!("Missing {} column", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| FaqError::Storage(format!("Invalid {} column type", name)))
}

fn optional_value(column: &StringArray, row: usize) -> Option<String> {
    (!column.is_null(row)).then(|| column.value(row).to_string())
}

/// Parse a single record batch from search results
fn parse_search_batch(batch: &RecordBatch, return_metadata: bool) -> Result<Vec<VectorMatch>> {
    let ids = string_column(batch, "id")?;
    let questions = string_column(batch, "question")?;
    let answers = string_column(batch, "answer")?;

    let vectors = batch
        .column_by_name("vector")
        .ok_or_else(|| FaqError::Storage("Missing vector column".to_string()))?
        .as_any()
        .downcast_ref::<FixedSizeListArray>()
        .ok_or_else(|| FaqError::Storage("Invalid vector column type".to_string()))?;

    let distances = batch
        .column_by_name("_distance")
        .and_then(|col| col.as_any().downcast_ref::<Float32Array>());

    let mut matches = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        let values = vectors
            .value(row)
            .as_any()
            .downcast_ref::<Float32Array>()
            .map(|v| v.values().to_vec())
            .unwrap_or_default();

        let metadata = return_metadata
            .then(|| FaqMetadata {
                question: optional_value(questions, row),
                answer: optional_value(answers, row),
            })
            .filter(|metadata| !metadata.is_empty());

        let distance = distances.map_or(0.0, |d| if d.is_null(row) { 0.0 } else { d.value(row) });

        matches.push(VectorMatch {
            id: ids.value(row).to_string(),
            // Cosine distance is 1 - cosine similarity
            score: 1.0 - distance,
            values,
            metadata,
        });
    }

    Ok(matches)
}
