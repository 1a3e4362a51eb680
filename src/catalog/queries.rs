//! SQL query constants
//!
//! Catalog queries issued by [`PostgresCatalog`](super::PostgresCatalog).
//! Identifier comparisons cast the parameter to `text` so that the
//! `information_schema` domain types never leak into parameter inference.

/// Base tables outside the system schemas
pub const LIST_TABLES: &str = r#"
    SELECT DISTINCT t.table_name::text AS table_name
    FROM information_schema.tables t
    WHERE t.table_type = 'BASE TABLE'
        AND t.table_schema NOT IN ('pg_catalog', 'information_schema')
    ORDER BY table_name
"#;

/// Columns of a table with identity and primary-key flags.
///
/// Unbounded `character varying` / `bit varying` report a length of -1.
pub const TABLE_COLUMNS: &str = r#"
    SELECT
        c.column_name::text AS column_name,
        c.data_type::text AS data_type,
        CASE
            WHEN c.character_maximum_length IS NOT NULL THEN c.character_maximum_length::int4
            WHEN c.data_type IN ('character varying', 'bit varying') THEN -1
        END AS max_length,
        c.is_nullable = 'YES' AS nullable,
        (c.is_identity = 'YES' OR COALESCE(c.column_default, '') LIKE 'nextval(%') AS is_identity,
        EXISTS (
            SELECT 1
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
                ON tc.constraint_name = kcu.constraint_name
                AND tc.table_schema = kcu.table_schema
                AND tc.table_name = kcu.table_name
            WHERE tc.constraint_type = 'PRIMARY KEY'
                AND tc.table_schema = c.table_schema
                AND tc.table_name = c.table_name
                AND kcu.column_name = c.column_name
        ) AS is_primary_key
    FROM information_schema.columns c
    WHERE c.table_name = $1::text
        AND c.table_schema NOT IN ('pg_catalog', 'information_schema')
    ORDER BY c.table_schema, c.ordinal_position
"#;

/// Columns of a view (no identity / key information)
pub const VIEW_COLUMNS: &str = r#"
    SELECT
        c.column_name::text AS column_name,
        c.data_type::text AS data_type,
        CASE
            WHEN c.character_maximum_length IS NOT NULL THEN c.character_maximum_length::int4
            WHEN c.data_type IN ('character varying', 'bit varying') THEN -1
        END AS max_length,
        c.is_nullable = 'YES' AS nullable
    FROM information_schema.columns c
    WHERE c.table_name = $1::text
        AND c.table_schema NOT IN ('pg_catalog', 'information_schema')
    ORDER BY c.table_schema, c.ordinal_position
"#;

/// Definition text of a view
pub const VIEW_DEFINITION: &str = r#"
    SELECT v.view_definition::text AS definition
    FROM information_schema.views v
    WHERE v.table_name = $1::text
        AND v.table_schema NOT IN ('pg_catalog', 'information_schema')
    ORDER BY v.table_schema
    LIMIT 1
"#;

/// Definition and return type of a routine.
///
/// `$2` is the routine type: `PROCEDURE` or `FUNCTION`. Overloads resolve to
/// the first specific name.
pub const ROUTINE_DEFINITION: &str = r#"
    SELECT
        r.routine_definition::text AS definition,
        r.data_type::text AS data_type,
        r.character_maximum_length::int4 AS max_length
    FROM information_schema.routines r
    WHERE r.routine_name = $1::text
        AND r.routine_type = $2::text
    ORDER BY r.specific_schema, r.specific_name
    LIMIT 1
"#;

/// Parameters of a routine in ordinal order (same overload rule as above)
pub const ROUTINE_PARAMETERS: &str = r#"
    WITH target AS (
        SELECT r.specific_schema, r.specific_name
        FROM information_schema.routines r
        WHERE r.routine_name = $1::text
            AND r.routine_type = $2::text
        ORDER BY r.specific_schema, r.specific_name
        LIMIT 1
    )
    SELECT
        p.parameter_name::text AS parameter_name,
        p.data_type::text AS data_type,
        p.character_maximum_length::int4 AS max_length,
        p.parameter_mode::text AS parameter_mode
    FROM information_schema.parameters p
    JOIN target t
        ON p.specific_schema = t.specific_schema
        AND p.specific_name = t.specific_name
    ORDER BY p.ordinal_position
"#;

/// Foreign-key column pairs where `$1` is the referenced or the referencing table
pub const FOREIGN_KEY_EDGES: &str = r#"
    SELECT DISTINCT
        con.conname::text AS constraint_name,
        src_ns.nspname::text AS referencing_schema,
        src.relname::text AS referencing_table,
        src_col.attname::text AS referencing_column,
        ref_ns.nspname::text AS referenced_schema,
        ref.relname::text AS referenced_table,
        ref_col.attname::text AS referenced_column
    FROM pg_constraint con
    JOIN pg_class src ON src.oid = con.conrelid
    JOIN pg_namespace src_ns ON src_ns.oid = src.relnamespace
    JOIN pg_class ref ON ref.oid = con.confrelid
    JOIN pg_namespace ref_ns ON ref_ns.oid = ref.relnamespace
    CROSS JOIN LATERAL unnest(con.conkey, con.confkey) AS cols(src_attnum, ref_attnum)
    JOIN pg_attribute src_col
        ON src_col.attrelid = con.conrelid AND src_col.attnum = cols.src_attnum
    JOIN pg_attribute ref_col
        ON ref_col.attrelid = con.confrelid AND ref_col.attnum = cols.ref_attnum
    WHERE con.contype = 'f'
        AND (ref.relname = $1::text OR src.relname = $1::text)
    ORDER BY referenced_table, referencing_table
"#;

/// Views (plain and materialized) whose rewrite rules depend on the table
pub const DEPENDENT_VIEWS: &str = r#"
    SELECT DISTINCT v.relname::text AS name
    FROM pg_depend d
    JOIN pg_rewrite rw ON rw.oid = d.objid
    JOIN pg_class v ON v.oid = rw.ev_class
    JOIN pg_class t ON t.oid = d.refobjid
    WHERE d.classid = 'pg_rewrite'::regclass
        AND d.refclassid = 'pg_class'::regclass
        AND v.relkind IN ('v', 'm')
        AND t.relkind IN ('r', 'p')
        AND v.oid <> t.oid
        AND t.relname = $1::text
    ORDER BY name
"#;

/// Routines of kind `$2` (`p` procedure, `f` function) that reference the table.
///
/// SQL-standard bodies are tracked in `pg_depend`; other bodies are matched on
/// the table name as a whole word in `prosrc`.
pub const DEPENDENT_ROUTINES: &str = r#"
    SELECT DISTINCT p.proname::text AS name
    FROM pg_proc p
    JOIN pg_namespace n ON n.oid = p.pronamespace
    WHERE p.prokind::text = $2::text
        AND n.nspname NOT IN ('pg_catalog', 'information_schema')
        AND (
            EXISTS (
                SELECT 1
                FROM pg_depend d
                JOIN pg_class t ON t.oid = d.refobjid
                WHERE d.classid = 'pg_proc'::regclass
                    AND d.objid = p.oid
                    AND d.refclassid = 'pg_class'::regclass
                    AND t.relname = $1::text
            )
            OR p.prosrc ~* ('\m' || regexp_replace($1::text, '([^[:alnum:]_])', '\\\1', 'g') || '\M')
        )
    ORDER BY name
"#;

/// Connection liveness check
pub const PING: &str = "SELECT 1";
