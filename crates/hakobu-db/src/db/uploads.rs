use hakobu_core::{
    models::{FileUpload, NewFileUpload},
    AppError,
};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

// The binary content column is deliberately absent here; only the download
// and extraction paths fetch it.
const UPLOAD_COLUMNS: &str = "id, uploader_id, original_name, file_type, file_size, mime_type, \
     extraction_status, claude_response, extracted_data, delivery_request_id, created_at, updated_at";

/// Repository for uploaded files and their extraction state machine
#[derive(Clone)]
pub struct FileUploadRepository {
    pool: PgPool,
}

impl FileUploadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self, new), fields(db.table = "file_uploads", db.operation = "insert"))]
    pub async fn create(&self, new: &NewFileUpload) -> Result<FileUpload, AppError> {
        let upload = sqlx::query_as::<Postgres, FileUpload>(&format!(
            r#"
            INSERT INTO file_uploads (uploader_id, content, original_name, file_type, file_size, mime_type)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {UPLOAD_COLUMNS}
            "#,
        ))
        .bind(new.uploader_id)
        .bind(&new.content)
        .bind(&new.original_name)
        .bind(new.file_type)
        .bind(new.content.len() as i64)
        .bind(&new.mime_type)
        .fetch_one(&self.pool)
        .await?;

        Ok(upload)
    }

    #[tracing::instrument(skip(self), fields(db.table = "file_uploads", db.operation = "select", db.record_id = %id))]
    pub async fn get(&self, id: Uuid) -> Result<Option<FileUpload>, AppError> {
        let upload = sqlx::query_as::<Postgres, FileUpload>(&format!(
            "SELECT {UPLOAD_COLUMNS} FROM file_uploads WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(upload)
    }

    #[tracing::instrument(skip(self), fields(db.table = "file_uploads", db.operation = "select", db.record_id = %id))]
    pub async fn get_owned(
        &self,
        id: Uuid,
        uploader_id: Uuid,
    ) -> Result<Option<FileUpload>, AppError> {
        let upload = sqlx::query_as::<Postgres, FileUpload>(&format!(
            "SELECT {UPLOAD_COLUMNS} FROM file_uploads WHERE id = $1 AND uploader_id = $2",
        ))
        .bind(id)
        .bind(uploader_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(upload)
    }

    /// The stored file bytes.
    #[tracing::instrument(skip(self), fields(db.table = "file_uploads", db.operation = "select", db.record_id = %id))]
    pub async fn get_content(&self, id: Uuid) -> Result<Option<Vec<u8>>, AppError> {
        let content = sqlx::query_scalar::<Postgres, Vec<u8>>(
            "SELECT content FROM file_uploads WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(content)
    }

    #[tracing::instrument(skip(self), fields(db.table = "file_uploads", db.operation = "select"))]
    pub async fn list_by_uploader(&self, uploader_id: Uuid) -> Result<Vec<FileUpload>, AppError> {
        let uploads = sqlx::query_as::<Postgres, FileUpload>(&format!(
            "SELECT {UPLOAD_COLUMNS} FROM file_uploads WHERE uploader_id = $1 ORDER BY created_at DESC",
        ))
        .bind(uploader_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(uploads)
    }

    #[tracing::instrument(skip(self), fields(db.table = "file_uploads", db.operation = "select"))]
    pub async fn list_all(&self) -> Result<Vec<FileUpload>, AppError> {
        let uploads = sqlx::query_as::<Postgres, FileUpload>(&format!(
            "SELECT {UPLOAD_COLUMNS} FROM file_uploads ORDER BY created_at DESC",
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(uploads)
    }

    #[tracing::instrument(skip(self), fields(db.table = "file_uploads", db.operation = "delete", db.record_id = %id))]
    pub async fn delete_owned(&self, id: Uuid, uploader_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM file_uploads WHERE id = $1 AND uploader_id = $2")
            .bind(id)
            .bind(uploader_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Compare-and-set claim of the document for extraction.
    ///
    /// Only `uploaded` and `failed` documents can enter `processing`; the
    /// status lives in the WHERE clause so concurrent duplicate requests
    /// cannot both win. Returns None when nothing was claimable.
    #[tracing::instrument(skip(self), fields(db.table = "file_uploads", db.operation = "update", db.record_id = %id))]
    pub async fn claim_for_extraction(&self, id: Uuid) -> Result<Option<FileUpload>, AppError> {
        let upload = sqlx::query_as::<Postgres, FileUpload>(&format!(
            r#"
            UPDATE file_uploads
            SET extraction_status = 'processing', updated_at = now()
            WHERE id = $1 AND extraction_status IN ('uploaded', 'failed')
            RETURNING {UPLOAD_COLUMNS}
            "#,
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(upload)
    }

    /// Terminal success: store the raw reply and the decoded field set.
    #[tracing::instrument(skip(self, raw_response, extracted_data), fields(db.table = "file_uploads", db.operation = "update", db.record_id = %id))]
    pub async fn mark_succeeded(
        &self,
        id: Uuid,
        raw_response: serde_json::Value,
        extracted_data: serde_json::Value,
    ) -> Result<FileUpload, AppError> {
        let upload = sqlx::query_as::<Postgres, FileUpload>(&format!(
            r#"
            UPDATE file_uploads
            SET extraction_status = 'succeeded',
                claude_response = $2,
                extracted_data = $3,
                updated_at = now()
            WHERE id = $1 AND extraction_status = 'processing'
            RETURNING {UPLOAD_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(raw_response)
        .bind(extracted_data)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            AppError::Internal("Upload left the processing state mid-extraction".to_string())
        })?;

        Ok(upload)
    }

    /// Re-runnable failure. The raw reply is stored when one was obtained
    /// (parse failures); otherwise whatever was there before is kept.
    #[tracing::instrument(skip(self, raw_response), fields(db.table = "file_uploads", db.operation = "update", db.record_id = %id))]
    pub async fn mark_failed(
        &self,
        id: Uuid,
        raw_response: Option<serde_json::Value>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE file_uploads
            SET extraction_status = 'failed',
                claude_response = COALESCE($2, claude_response),
                updated_at = now()
            WHERE id = $1 AND extraction_status = 'processing'
            "#,
        )
        .bind(id)
        .bind(raw_response)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Link the document to the delivery request it produced.
    #[tracing::instrument(skip(self), fields(db.table = "file_uploads", db.operation = "update", db.record_id = %id))]
    pub async fn link_delivery_request(
        &self,
        id: Uuid,
        delivery_request_id: Uuid,
    ) -> Result<FileUpload, AppError> {
        let upload = sqlx::query_as::<Postgres, FileUpload>(&format!(
            r#"
            UPDATE file_uploads
            SET delivery_request_id = $2, updated_at = now()
            WHERE id = $1
            RETURNING {UPLOAD_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(delivery_request_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        Ok(upload)
    }
}
