use sqlx::PgPool;

/// All `id` columns must be bigint (entity tables) or smallint (lookup and
/// singleton tables).
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_all_pks_are_correct_type(pool: PgPool) {
    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT table_name, data_type
         FROM information_schema.columns
         WHERE column_name = 'id'
           AND table_schema = 'public'
           AND table_name != '_sqlx_migrations'
         ORDER BY table_name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    assert!(!rows.is_empty());
    for (table, data_type) in &rows {
        assert!(
            data_type == "bigint" || data_type == "smallint",
            "Table {table}.id should be bigint or smallint, got {data_type}"
        );
    }
}

/// Every table must have created_at and updated_at as timestamptz.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_all_tables_have_timestamps(pool: PgPool) {
    let tables: Vec<(String,)> = sqlx::query_as(
        "SELECT table_name
         FROM information_schema.tables
         WHERE table_schema = 'public'
           AND table_type = 'BASE TABLE'
           AND table_name != '_sqlx_migrations'
         ORDER BY table_name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    for (table,) in &tables {
        for col in ["created_at", "updated_at"] {
            let result: Option<(String,)> = sqlx::query_as(
                "SELECT data_type
                 FROM information_schema.columns
                 WHERE table_schema = 'public'
                   AND table_name = $1
                   AND column_name = $2",
            )
            .bind(table)
            .bind(col)
            .fetch_optional(&pool)
            .await
            .unwrap();

            let (data_type,) =
                result.unwrap_or_else(|| panic!("Table {table} is missing column {col}"));
            assert_eq!(
                data_type, "timestamp with time zone",
                "Table {table}.{col} should be timestamptz, got {data_type}"
            );
        }
    }
}

/// Unique constraints follow the `uq_` naming convention the API relies on
/// to turn violations into 409 responses.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unique_constraints_are_prefixed(pool: PgPool) {
    let names: Vec<(String,)> = sqlx::query_as(
        "SELECT constraint_name
         FROM information_schema.table_constraints
         WHERE table_schema = 'public' AND constraint_type = 'UNIQUE'",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    for (name,) in &names {
        assert!(name.starts_with("uq_"), "Unique constraint {name} should start with uq_");
    }
}

/// Status lookup rows must line up with the Rust enums.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_status_seed_data_matches_enums(pool: PgPool) {
    use predictcr_db::models::status::{JobStatus, SampleStatus};

    for table in ["sample_statuses", "job_statuses"] {
        let rows: Vec<(i16, String)> =
            sqlx::query_as(&format!("SELECT id, name FROM {table} ORDER BY id"))
                .fetch_all(&pool)
                .await
                .unwrap();
        for (id, name) in rows {
            let expected = if table == "sample_statuses" {
                SampleStatus::from_id(id).map(SampleStatus::name)
            } else {
                JobStatus::from_id(id).map(JobStatus::name)
            };
            assert_eq!(expected, Some(name.as_str()), "{table} row {id}");
        }
    }
}

/// The settings table holds exactly one row.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_settings_singleton(pool: PgPool) {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM settings")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);

    let err = sqlx::query("INSERT INTO settings (id) VALUES (2)")
        .execute(&pool)
        .await;
    assert!(err.is_err(), "a second settings row must be refused");
}
