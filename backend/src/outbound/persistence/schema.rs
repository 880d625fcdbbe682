//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Registered accounts.
    users (id) {
        id -> Uuid,
        /// Trimmed, lower-cased address; unique.
        email -> Varchar,
        /// Encoded bcrypt hash.
        password_hash -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Incident reports. Rows are never updated after insert.
    incidents (id) {
        id -> Uuid,
        /// Reporter, when the report was submitted with a bearer token.
        user_id -> Nullable<Uuid>,
        /// Canonical category spelling, e.g. `Fire`.
        incident_type -> Varchar,
        title -> Nullable<Text>,
        description -> Nullable<Text>,
        location -> Nullable<Text>,
        latitude -> Nullable<Float8>,
        longitude -> Nullable<Float8>,
        /// Ordered `/uploads/<file>` references.
        images -> Array<Text>,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(incidents -> users (user_id));
diesel::allow_tables_to_appear_in_same_query!(users, incidents);
