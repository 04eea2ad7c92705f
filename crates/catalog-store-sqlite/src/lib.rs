use std::path::Path;

use anyhow::{anyhow, Context, Result};
use catalog_core::{
    CatalogStore, Category, CategoryId, Pagination, Product, ProductId, ProductScope, User, UserId,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, Transaction};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use ulid::Ulid;

const LATEST_SCHEMA_VERSION: i64 = 2;

const CREATE_SCHEMA_MIGRATIONS_SQL: &str = r"
CREATE TABLE IF NOT EXISTS schema_migrations (
  version INTEGER PRIMARY KEY,
  applied_at TEXT NOT NULL
);
";

const MIGRATION_001_SQL: &str = r"
CREATE TABLE IF NOT EXISTS users (
  user_id TEXT PRIMARY KEY,
  email TEXT NOT NULL UNIQUE,
  full_name TEXT,
  is_superuser INTEGER NOT NULL CHECK (is_superuser IN (0, 1)),
  created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS categories (
  category_id TEXT PRIMARY KEY,
  name TEXT NOT NULL,
  description TEXT,
  created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS products (
  product_id TEXT PRIMARY KEY,
  name TEXT NOT NULL,
  description TEXT,
  price REAL NOT NULL,
  rating REAL NOT NULL,
  category_id TEXT NOT NULL,
  owner_id TEXT NOT NULL,
  created_at TEXT NOT NULL
);
";

// Lookups used by scoped listings and recommendations.
const MIGRATION_002_SQL: &str = r"
CREATE INDEX IF NOT EXISTS idx_products_owner ON products(owner_id);
CREATE INDEX IF NOT EXISTS idx_products_category ON products(category_id);
CREATE INDEX IF NOT EXISTS idx_products_rating ON products(rating DESC);
";

const MIGRATIONS: [(i64, &str); 2] = [(1, MIGRATION_001_SQL), (2, MIGRATION_002_SQL)];

const PRODUCT_COLUMNS: &str =
    "product_id, name, description, price, rating, category_id, owner_id";

pub struct SqliteStore {
    conn: Connection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchemaStatus {
    pub current_version: i64,
    pub target_version: i64,
    pub pending_versions: Vec<i64>,
}

struct ProductRow {
    product_id: String,
    name: String,
    description: Option<String>,
    price: f64,
    rating: f64,
    category_id: String,
    owner_id: String,
}

impl ProductRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            product_id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            price: row.get(3)?,
            rating: row.get(4)?,
            category_id: row.get(5)?,
            owner_id: row.get(6)?,
        })
    }

    fn into_product(self) -> Result<Product> {
        Ok(Product {
            id: ProductId(parse_ulid(&self.product_id)?),
            name: self.name,
            description: self.description,
            price: self.price,
            rating: self.rating,
            category_id: CategoryId(parse_ulid(&self.category_id)?),
            owner_id: UserId(parse_ulid(&self.owner_id)?),
        })
    }
}

impl SqliteStore {
    /// Open a SQLite-backed catalog store and configure required runtime pragmas.
    ///
    /// # Errors
    /// Returns an error when the database cannot be opened or pragmas cannot be applied.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open sqlite database at {}", path.display()))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to configure sqlite pragmas")?;

        Ok(Self { conn })
    }

    /// Report current and target schema versions plus pending migrations.
    ///
    /// # Errors
    /// Returns an error when schema metadata cannot be read or initialized.
    pub fn schema_status(&self) -> Result<SchemaStatus> {
        self.conn
            .execute_batch(CREATE_SCHEMA_MIGRATIONS_SQL)
            .context("failed to apply schema_migrations table")?;
        let current_version = current_schema_version(&self.conn)?;
        let pending_versions = MIGRATIONS
            .iter()
            .map(|(version, _)| *version)
            .filter(|version| *version > current_version)
            .collect::<Vec<_>>();

        Ok(SchemaStatus {
            current_version,
            target_version: LATEST_SCHEMA_VERSION,
            pending_versions,
        })
    }

    /// Apply all forward migrations up to the latest supported schema version.
    ///
    /// # Errors
    /// Returns an error when the database is newer than this build or a migration fails.
    pub fn migrate(&mut self) -> Result<()> {
        self.conn
            .execute_batch(CREATE_SCHEMA_MIGRATIONS_SQL)
            .context("failed to apply schema_migrations table")?;

        let version = current_schema_version(&self.conn)?;
        if version > LATEST_SCHEMA_VERSION {
            return Err(anyhow!(
                "unsupported schema version {version}; expected {LATEST_SCHEMA_VERSION}"
            ));
        }

        for (target, sql) in MIGRATIONS {
            if target <= version {
                continue;
            }
            let tx = self
                .conn
                .transaction()
                .with_context(|| format!("failed to start migration v{target} transaction"))?;
            tx.execute_batch(sql).with_context(|| format!("failed to apply migration v{target}"))?;
            record_schema_version(&tx, target)?;
            tx.commit().with_context(|| format!("failed to commit migration v{target}"))?;
        }

        Ok(())
    }

    fn write<F>(&mut self, label: &str, op: F) -> Result<()>
    where
        F: FnOnce(&Transaction<'_>) -> Result<()>,
    {
        let tx = self.conn.transaction().context("failed to start transaction")?;
        op(&tx)?;
        tx.commit().with_context(|| format!("failed to commit {label} transaction"))?;
        Ok(())
    }

    fn query_products(&self, sql: &str, values: Vec<Value>) -> Result<Vec<Product>> {
        let mut stmt = self.conn.prepare(sql).context("failed to prepare product query")?;
        let rows = stmt
            .query_map(params_from_iter(values), ProductRow::read)
            .context("failed to query products")?;

        let mut products = Vec::new();
        for row in rows {
            products.push(row.context("failed to read product row")?.into_product()?);
        }
        Ok(products)
    }
}

impl CatalogStore for SqliteStore {
    fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let row = self
            .conn
            .query_row(
                "SELECT user_id, email, full_name, is_superuser FROM users WHERE user_id = ?1",
                params![id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, bool>(3)?,
                    ))
                },
            )
            .optional()
            .with_context(|| format!("failed to load user {id}"))?;

        row.map(|(user_id, email, full_name, is_superuser)| {
            Ok(User { id: UserId(parse_ulid(&user_id)?), email, full_name, is_superuser })
        })
        .transpose()
    }

    fn insert_user(&mut self, user: &User) -> Result<()> {
        self.write("user insert", |tx| {
            tx.execute(
                "INSERT INTO users(user_id, email, full_name, is_superuser, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    user.id.to_string(),
                    user.email,
                    user.full_name,
                    user.is_superuser,
                    now_rfc3339()?
                ],
            )
            .context("failed to insert user")?;
            Ok(())
        })
    }

    fn get_category(&self, id: CategoryId) -> Result<Option<Category>> {
        let row = self
            .conn
            .query_row(
                "SELECT category_id, name, description FROM categories WHERE category_id = ?1",
                params![id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                    ))
                },
            )
            .optional()
            .with_context(|| format!("failed to load category {id}"))?;

        row.map(|(category_id, name, description)| {
            Ok(Category { id: CategoryId(parse_ulid(&category_id)?), name, description })
        })
        .transpose()
    }

    fn count_categories(&self) -> Result<u64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get::<_, i64>(0))
            .context("failed to count categories")?;
        to_count(count)
    }

    fn list_categories(&self, page: Pagination) -> Result<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT category_id, name, description
                 FROM categories
                 ORDER BY rowid ASC
                 LIMIT ?1 OFFSET ?2",
            )
            .context("failed to prepare category listing")?;
        let mut rows = stmt
            .query(params![i64::from(page.limit), i64::from(page.skip)])
            .context("failed to list categories")?;

        let mut categories = Vec::new();
        while let Some(row) = rows.next().context("failed to read category row")? {
            let category_id: String = row.get(0).context("failed to read category id")?;
            categories.push(Category {
                id: CategoryId(parse_ulid(&category_id)?),
                name: row.get(1).context("failed to read category name")?,
                description: row.get(2).context("failed to read category description")?,
            });
        }
        Ok(categories)
    }

    fn insert_category(&mut self, category: &Category) -> Result<()> {
        self.write("category insert", |tx| {
            tx.execute(
                "INSERT INTO categories(category_id, name, description, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    category.id.to_string(),
                    category.name,
                    category.description,
                    now_rfc3339()?
                ],
            )
            .context("failed to insert category")?;
            Ok(())
        })
    }

    fn update_category(&mut self, category: &Category) -> Result<()> {
        self.write("category update", |tx| {
            let changed = tx
                .execute(
                    "UPDATE categories SET name = ?2, description = ?3 WHERE category_id = ?1",
                    params![category.id.to_string(), category.name, category.description],
                )
                .context("failed to update category")?;
            if changed == 0 {
                return Err(anyhow!("category row missing during update: {}", category.id));
            }
            Ok(())
        })
    }

    fn delete_category(&mut self, id: CategoryId) -> Result<()> {
        self.write("category delete", |tx| {
            tx.execute("DELETE FROM categories WHERE category_id = ?1", params![id.to_string()])
                .context("failed to delete category")?;
            Ok(())
        })
    }

    fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE product_id = ?1"),
                params![id.to_string()],
                ProductRow::read,
            )
            .optional()
            .with_context(|| format!("failed to load product {id}"))?;
        row.map(ProductRow::into_product).transpose()
    }

    fn count_products(&self, scope: ProductScope) -> Result<u64> {
        let count = match scope {
            ProductScope::All => {
                self.conn.query_row("SELECT COUNT(*) FROM products", [], |row| row.get::<_, i64>(0))
            }
            ProductScope::OwnedBy(owner_id) => self.conn.query_row(
                "SELECT COUNT(*) FROM products WHERE owner_id = ?1",
                params![owner_id.to_string()],
                |row| row.get::<_, i64>(0),
            ),
        }
        .context("failed to count products")?;
        to_count(count)
    }

    fn list_products(&self, scope: ProductScope, page: Pagination) -> Result<Vec<Product>> {
        let window = [Value::Integer(i64::from(page.limit)), Value::Integer(i64::from(page.skip))];
        match scope {
            ProductScope::All => self.query_products(
                &format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY rowid ASC LIMIT ?1 OFFSET ?2"
                ),
                window.to_vec(),
            ),
            ProductScope::OwnedBy(owner_id) => {
                let mut values = window.to_vec();
                values.push(Value::Text(owner_id.to_string()));
                self.query_products(
                    &format!(
                        "SELECT {PRODUCT_COLUMNS} FROM products
                         WHERE owner_id = ?3
                         ORDER BY rowid ASC LIMIT ?1 OFFSET ?2"
                    ),
                    values,
                )
            }
        }
    }

    fn insert_product(&mut self, product: &Product) -> Result<()> {
        self.write("product insert", |tx| {
            tx.execute(
                "INSERT INTO products(
                    product_id, name, description, price, rating, category_id, owner_id, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    product.id.to_string(),
                    product.name,
                    product.description,
                    product.price,
                    product.rating,
                    product.category_id.to_string(),
                    product.owner_id.to_string(),
                    now_rfc3339()?,
                ],
            )
            .context("failed to insert product")?;
            Ok(())
        })
    }

    fn update_product(&mut self, product: &Product) -> Result<()> {
        self.write("product update", |tx| {
            let changed = tx
                .execute(
                    "UPDATE products
                     SET name = ?2, description = ?3, price = ?4, rating = ?5, category_id = ?6
                     WHERE product_id = ?1",
                    params![
                        product.id.to_string(),
                        product.name,
                        product.description,
                        product.price,
                        product.rating,
                        product.category_id.to_string(),
                    ],
                )
                .context("failed to update product")?;
            if changed == 0 {
                return Err(anyhow!("product row missing during update: {}", product.id));
            }
            Ok(())
        })
    }

    fn delete_product(&mut self, id: ProductId) -> Result<()> {
        self.write("product delete", |tx| {
            tx.execute("DELETE FROM products WHERE product_id = ?1", params![id.to_string()])
                .context("failed to delete product")?;
            Ok(())
        })
    }

    fn products_in_owned_categories(
        &self,
        owner_id: UserId,
        page: Pagination,
    ) -> Result<Vec<Product>> {
        self.query_products(
            &format!(
                "SELECT {PRODUCT_COLUMNS} FROM products
                 WHERE category_id IN (SELECT category_id FROM products WHERE owner_id = ?1)
                   AND owner_id <> ?1
                 ORDER BY rowid ASC LIMIT ?2 OFFSET ?3"
            ),
            vec![
                Value::Text(owner_id.to_string()),
                Value::Integer(i64::from(page.limit)),
                Value::Integer(i64::from(page.skip)),
            ],
        )
    }

    fn products_by_rating(&self, page: Pagination) -> Result<Vec<Product>> {
        self.query_products(
            &format!(
                "SELECT {PRODUCT_COLUMNS} FROM products
                 ORDER BY rating DESC, rowid ASC
                 LIMIT ?1 OFFSET ?2"
            ),
            vec![Value::Integer(i64::from(page.limit)), Value::Integer(i64::from(page.skip))],
        )
    }
}

fn current_schema_version(conn: &Connection) -> Result<i64> {
    let version = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_migrations", [], |row| {
            row.get::<_, i64>(0)
        })
        .context("failed to read current schema version")?;
    Ok(version)
}

fn record_schema_version(conn: &Connection, version: i64) -> Result<()> {
    let now = now_rfc3339()?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_migrations(version, applied_at) VALUES (?1, ?2)",
        params![version, now],
    )
    .with_context(|| format!("failed to record migration version {version}"))?;
    Ok(())
}

fn to_count(value: i64) -> Result<u64> {
    u64::try_from(value).with_context(|| format!("negative row count: {value}"))
}

fn now_rfc3339() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .context("failed to format RFC3339 timestamp")
}

fn parse_ulid(raw: &str) -> Result<Ulid> {
    Ulid::from_string(raw).with_context(|| format!("invalid ULID: {raw}"))
}
