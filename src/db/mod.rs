use crate::errors::{AppError, AppResult};
use crate::folders::normalize_folder_path;
use crate::models::{FileRecord, OwnerId, ParaBucket};
use chrono::{DateTime, Utc};
use regex::Regex;
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

const SCHEMA_SQL: &str = include_str!("schema.sql");

const FILE_COLUMNS: &str = "id, owner_id, base_directory, original_relative_path, is_directory, is_development, \
     size_bytes, modified_at, keywords_json, korean_file_name, english_file_name, para_bucket, para_folder, \
     para_full_path, reason, created_at, updated_at";

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug)]
pub struct Database {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl Database {
    pub fn new(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| AppError::Io(err.to_string()))?;
        }
        let conn = Connection::open(path).map_err(AppError::from)?;
        conn.execute_batch(SCHEMA_SQL).map_err(AppError::from)?;
        register_functions(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Internal("database mutex poisoned".to_string()))
    }

    pub fn find_by_owner(&self, owner: &OwnerId) -> AppResult<Vec<FileRecord>> {
        let sql = format!(
            "SELECT {} FROM organized_files WHERE owner_id = ?1 ORDER BY original_relative_path",
            FILE_COLUMNS
        );
        self.query_records(&sql, params![owner.as_str()])
    }

    pub fn find_by_owner_and_bucket(&self, owner: &OwnerId, bucket: ParaBucket) -> AppResult<Vec<FileRecord>> {
        let sql = format!(
            "SELECT {} FROM organized_files WHERE owner_id = ?1 AND para_bucket = ?2 ORDER BY original_relative_path",
            FILE_COLUMNS
        );
        self.query_records(&sql, params![owner.as_str(), bucket.as_str()])
    }

    pub fn find_by_owner_and_bucket_and_folder(
        &self,
        owner: &OwnerId,
        bucket: ParaBucket,
        folder: &str,
    ) -> AppResult<Vec<FileRecord>> {
        let sql = format!(
            "SELECT {} FROM organized_files
             WHERE owner_id = ?1 AND para_bucket = ?2 AND para_normalize(para_folder, ?2) = ?3
             ORDER BY original_relative_path",
            FILE_COLUMNS
        );
        self.query_records(
            &sql,
            params![owner.as_str(), bucket.as_str(), normalize_folder_path(folder, Some(bucket))],
        )
    }

    pub fn find_by_owner_and_bucket_and_folder_pattern(
        &self,
        owner: &OwnerId,
        bucket: ParaBucket,
        pattern: &str,
    ) -> AppResult<Vec<FileRecord>> {
        let sql = format!(
            "SELECT {} FROM organized_files
             WHERE owner_id = ?1 AND para_bucket = ?2 AND regexp(?3, para_normalize(para_folder, ?2))
             ORDER BY is_directory DESC, korean_file_name, english_file_name, original_relative_path",
            FILE_COLUMNS
        );
        self.query_records(&sql, params![owner.as_str(), bucket.as_str(), pattern])
    }

    pub fn find_by_owner_and_path(&self, owner: &OwnerId, original_relative_path: &str) -> AppResult<Option<FileRecord>> {
        let sql = format!(
            "SELECT {} FROM organized_files WHERE owner_id = ?1 AND original_relative_path = ?2",
            FILE_COLUMNS
        );
        let conn = self.lock()?;
        conn.query_row(&sql, params![owner.as_str(), original_relative_path], parse_file_row)
            .optional()
            .map_err(AppError::from)
    }

    pub fn find_by_id_and_owner(&self, id: &str, owner: &OwnerId) -> AppResult<Option<FileRecord>> {
        let sql = format!(
            "SELECT {} FROM organized_files WHERE id = ?1 AND owner_id = ?2",
            FILE_COLUMNS
        );
        let conn = self.lock()?;
        conn.query_row(&sql, params![id, owner.as_str()], parse_file_row)
            .optional()
            .map_err(AppError::from)
    }

    pub fn exists_by_id_and_owner(&self, id: &str, owner: &OwnerId) -> AppResult<bool> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(1) FROM organized_files WHERE id = ?1 AND owner_id = ?2",
            params![id, owner.as_str()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn delete_by_id(&self, id: &str) -> AppResult<bool> {
        let conn = self.lock()?;
        let affected = conn.execute("DELETE FROM organized_files WHERE id = ?1", [id])?;
        Ok(affected > 0)
    }

    pub fn upsert(&self, record: &FileRecord) -> AppResult<FileRecord> {
        let conn = self.lock()?;
        upsert_row(&conn, record, Utc::now())
    }

    pub fn rewrite_records(&self, records: &[FileRecord]) -> AppResult<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let now = Utc::now();
        for record in records {
            upsert_row(&tx, record, now)?;
        }
        tx.commit()?;
        Ok(records.len())
    }

    fn query_records(&self, sql: &str, params: impl rusqlite::Params) -> AppResult<Vec<FileRecord>> {
        let conn = self.lock()?;
        let mut statement = conn.prepare(sql)?;
        let records = statement
            .query_map(params, parse_file_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

fn upsert_row(conn: &Connection, record: &FileRecord, now: DateTime<Utc>) -> AppResult<FileRecord> {
    let id = if record.id.trim().is_empty() {
        Uuid::new_v4().to_string()
    } else {
        record.id.clone()
    };
    let para_full_path = record.para_bucket.full_path(record.para_folder.as_deref());
    let size_bytes = i64::try_from(record.size_bytes)
        .map_err(|_| AppError::Validation(format!("sizeBytes out of range: {}", record.size_bytes)))?;

    conn.execute(
        "INSERT INTO organized_files (
           id, owner_id, base_directory, original_relative_path, is_directory, is_development,
           size_bytes, modified_at, keywords_json, korean_file_name, english_file_name, para_bucket,
           para_folder, para_full_path, reason, created_at, updated_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
         ON CONFLICT(id) DO UPDATE SET
           owner_id = excluded.owner_id,
           base_directory = excluded.base_directory,
           original_relative_path = excluded.original_relative_path,
           is_directory = excluded.is_directory,
           is_development = excluded.is_development,
           size_bytes = excluded.size_bytes,
           modified_at = excluded.modified_at,
           keywords_json = excluded.keywords_json,
           korean_file_name = excluded.korean_file_name,
           english_file_name = excluded.english_file_name,
           para_bucket = excluded.para_bucket,
           para_folder = excluded.para_folder,
           para_full_path = excluded.para_full_path,
           reason = excluded.reason,
           updated_at = excluded.updated_at",
        params![
            id,
            record.owner_id,
            record.base_directory,
            record.original_relative_path,
            record.is_directory,
            record.is_development,
            size_bytes,
            record.modified_at,
            serde_json::to_string(&record.keywords)?,
            record.korean_file_name,
            record.english_file_name,
            record.para_bucket.as_str(),
            record.para_folder,
            para_full_path,
            record.reason,
            record.created_at.to_rfc3339(),
            now.to_rfc3339(),
        ],
    )?;

    Ok(FileRecord {
        id,
        para_full_path,
        updated_at: now,
        ..record.clone()
    })
}

fn register_functions(conn: &Connection) -> AppResult<()> {
    conn.create_scalar_function(
        "regexp",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let pattern = ctx.get_or_create_aux(0, |raw| -> Result<Regex, BoxError> {
                Ok(Regex::new(raw.as_str()?)?)
            })?;
            let text = ctx.get::<Option<String>>(1)?.unwrap_or_default();
            Ok(pattern.is_match(&text))
        },
    )?;

    conn.create_scalar_function(
        "para_normalize",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let folder = ctx.get::<Option<String>>(0)?.unwrap_or_default();
            let bucket = ctx
                .get::<Option<String>>(1)?
                .and_then(|raw| ParaBucket::parse(&raw).ok());
            Ok(normalize_folder_path(&folder, bucket))
        },
    )?;

    Ok(())
}

fn parse_file_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FileRecord> {
    let keywords_raw: String = row.get(8)?;
    Ok(FileRecord {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        base_directory: row.get(2)?,
        original_relative_path: row.get(3)?,
        is_directory: row.get::<_, i32>(4)? != 0,
        is_development: row.get::<_, i32>(5)? != 0,
        size_bytes: u64::try_from(row.get::<_, i64>(6)?).unwrap_or_default(),
        modified_at: row.get(7)?,
        keywords: serde_json::from_str::<Vec<String>>(&keywords_raw).unwrap_or_default(),
        korean_file_name: row.get(9)?,
        english_file_name: row.get(10)?,
        para_bucket: parse_bucket(&row.get::<_, String>(11)?)?,
        para_folder: row.get(12)?,
        para_full_path: row.get(13)?,
        reason: row.get(14)?,
        created_at: parse_time(&row.get::<_, String>(15)?)?,
        updated_at: parse_time(&row.get::<_, String>(16)?)?,
    })
}

fn parse_bucket(raw: &str) -> rusqlite::Result<ParaBucket> {
    ParaBucket::parse(raw).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(
            11,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, error.to_string())),
        )
    })
}

fn parse_time(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, error.to_string())),
            )
        })
}
