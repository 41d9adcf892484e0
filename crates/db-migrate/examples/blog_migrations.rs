//! Example: Blog Application Migrations
//!
//! This example demonstrates how to use db-migrate to manage database
//! schema changes for a blog application with users, posts, and comments.
//!
//! Run with: cargo run --example blog_migrations -p db-migrate

use db_migrate::prelude::*;

// =============================================================================
// Migration Bodies
// =============================================================================

/// Create the users table.
fn create_users(schema: &mut Schema) -> Result<()> {
    schema.create_table("user", |t| {
        t.primary_key();
        t.column("username", "VARCHAR(100)").not_null().unique();
        t.column("email", "VARCHAR(255)").not_null();
        t.column("is_active", "BOOLEAN").not_null().default(true);
        t.timestamps();
    });
    Ok(())
}

/// Create the posts table, keyed to its author.
fn create_posts(schema: &mut Schema) -> Result<()> {
    schema.create_table("post", |t| {
        t.primary_key();
        t.foreign_key("author_id").not_null();
        t.column("title", "VARCHAR(200)").not_null();
        t.column("slug", "VARCHAR(200)").not_null().unique();
        t.column("content", "TEXT").not_null();
        t.column("published", "BOOLEAN").not_null().default(false);
        t.timestamps();
    });
    Ok(())
}

/// Create the comments table.
fn create_comments(schema: &mut Schema) -> Result<()> {
    schema.create_table("comment", |t| {
        t.primary_key();
        t.foreign_key("post_id").not_null();
        t.foreign_key("author_id").not_null();
        t.column("content", "TEXT").not_null();
        t.timestamps();
    });
    Ok(())
}

/// Add a bio to users, rename the posts' body column and drop the profile
/// table older installs still carry.
fn extend_profiles(schema: &mut Schema) -> Result<()> {
    schema
        .alter_table("user", |t| {
            t.add_column(column("bio", "TEXT"));
        })
        .alter_table("post", |t| {
            t.rename_column("content", "body");
        })
        .if_table_exists("legacy_profile", |schema| {
            schema.drop_table("legacy_profile", false);
        });
    Ok(())
}

/// Index published posts for listing pages.
fn index_published(schema: &mut Schema) -> Result<()> {
    schema.create_index(
        CreateIndex::new("idx_post_published", "post", ["published", "created_at"])
            .drop_if_exists(),
    );
    Ok(())
}

type Body = fn(&mut Schema) -> Result<()>;

const MIGRATIONS: &[(&str, Body)] = &[
    ("0001_create_users", create_users),
    ("0002_create_posts", create_posts),
    ("0003_create_comments", create_comments),
    ("0004_extend_profiles", extend_profiles),
    ("0005_index_published", index_published),
];

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    println!("{}", "=".repeat(70));
    println!(" DB-MIGRATE: Blog Application Example");
    println!("{}", "=".repeat(70));
    println!();

    let client = SqliteClient::connect("sqlite::memory:").await?;

    // Show SQL for each dialect without touching the database
    println!("[1] Generated SQL for PostgreSQL:");
    println!("{}", "-".repeat(70));
    for &(name, body) in MIGRATIONS {
        println!("\n-- Migration: {name}");
        for sql in sql_for(DialectFeatures::postgres(), body)? {
            println!("{sql};");
        }
    }
    println!();
    println!("{}", "-".repeat(70));
    println!();

    println!("[2] Applying migrations to SQLite...\n");
    for &(name, body) in MIGRATIONS {
        let outcome = client.migrate(name, body).await?;
        println!("    {name}: {outcome:?}");
    }
    println!();

    println!("[3] Applying again (nothing should run)...\n");
    for &(name, body) in MIGRATIONS {
        let outcome = client.migrate(name, body).await?;
        println!("    {name}: {outcome:?}");
    }
    println!();

    println!("[4] Ledger contents:\n");
    let mut session = client.session().await?;
    for record in Ledger::new(&mut session).records().await? {
        println!(
            "    [X] {} ({})",
            record.name,
            record.created_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
    println!();

    let mut catalog = InformationSchema::new(&mut session);
    for table in ["user", "post", "comment", "tag"] {
        println!(
            "    table {table:<8} exists: {}",
            catalog.table_exists(table).await?
        );
    }

    Ok(())
}
