use crate::error::{StoreError, StoreResult};
use crate::models::{
    Contact, ContactId, ContactRecord, Deal, DealStage, Interaction, InteractionType, Tag,
};
use crate::repositories::traits::{ContactStore, PageWindow};
use crate::search::{ContactFilter, ContactQuery, SortField, SortSpec};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

/// Tables plus the indexes the search relies on.
///
/// Timestamps are stored as microseconds since the Unix epoch (UTC); decimals as
/// their canonical string form.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS contacts (
    id                   INTEGER PRIMARY KEY,
    first_name           TEXT    NOT NULL,
    last_name            TEXT    NOT NULL,
    email                TEXT    NOT NULL,
    company              TEXT    NOT NULL,
    city                 TEXT    NOT NULL,
    last_contact_date    INTEGER NOT NULL,
    deal_stage           INTEGER NULL,
    base_potential_value TEXT    NULL
);

CREATE TABLE IF NOT EXISTS tags (
    id   INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS contact_tags (
    contact_id INTEGER NOT NULL REFERENCES contacts(id) ON DELETE CASCADE,
    tag_id     INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
    PRIMARY KEY (contact_id, tag_id)
);

CREATE TABLE IF NOT EXISTS interactions (
    id         INTEGER PRIMARY KEY,
    contact_id INTEGER NOT NULL REFERENCES contacts(id) ON DELETE CASCADE,
    type       INTEGER NOT NULL,
    date       INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS deals (
    id              INTEGER PRIMARY KEY,
    contact_id      INTEGER NOT NULL REFERENCES contacts(id) ON DELETE CASCADE,
    estimated_value TEXT NULL
);

CREATE INDEX IF NOT EXISTS ix_contacts_city_stage_last_contact
    ON contacts (city, deal_stage, last_contact_date);
CREATE INDEX IF NOT EXISTS ix_contact_tags_tag_id ON contact_tags (tag_id);
CREATE INDEX IF NOT EXISTS ix_interactions_contact_id_type ON interactions (contact_id, type);
CREATE INDEX IF NOT EXISTS ix_deals_contact_id_value ON deals (contact_id, estimated_value);
";

const CONTACT_COLUMNS: &str = "c.id, c.first_name, c.last_name, c.email, c.company, c.city, \
     c.last_contact_date, c.deal_stage, c.base_potential_value";

/// Upper bound on ids bound into one `IN (...)` list.
const ID_CHUNK: usize = 500;

/// Contact store backed by SQLite.
///
/// Filters, ordering, counting and paging run inside the database. Related rows for
/// a page are loaded with one batched query per relation rather than per contact.
#[derive(Clone)]
pub struct SqliteContactStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteContactStore {
    /// Open (or create) a database file and ensure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| StoreError::Unavailable("connection lock poisoned".to_string()))?;
            f(&mut *guard)
        })
        .await
        .map_err(|e| StoreError::Other(format!("store task failed: {}", e)))?
    }

    /// Insert a contact row, or update it in place if the id exists.
    ///
    /// Related rows of an existing contact are kept.
    pub async fn insert_contact(&self, contact: &Contact) -> StoreResult<()> {
        let contact = contact.clone();
        self.with_conn(move |conn| {
            write_contact(conn, &contact)?;
            Ok(())
        })
        .await
    }

    /// Return the tag called `name`, creating it if needed.
    pub async fn insert_tag(&self, name: &str) -> StoreResult<Tag> {
        let name = name.to_string();
        self.with_conn(move |conn| {
            let id = ensure_tag(conn, &name)?;
            Ok(Tag { id, name })
        })
        .await
    }

    /// Associate a tag with a contact. Repeating the association is a no-op.
    pub async fn tag_contact(&self, contact_id: ContactId, tag_name: &str) -> StoreResult<()> {
        let tag_name = tag_name.to_string();
        self.with_conn(move |conn| {
            let tag_id = ensure_tag(conn, &tag_name)?;
            conn.execute(
                "INSERT OR IGNORE INTO contact_tags (contact_id, tag_id) VALUES (?1, ?2)",
                params![contact_id, tag_id],
            )?;
            Ok(())
        })
        .await
    }

    /// Record an interaction and return its id.
    pub async fn insert_interaction(
        &self,
        contact_id: ContactId,
        interaction_type: InteractionType,
        date: DateTime<Utc>,
    ) -> StoreResult<i64> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO interactions (contact_id, type, date) VALUES (?1, ?2, ?3)",
                params![contact_id, interaction_type.code(), date.timestamp_micros()],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    /// Record a deal and return its id.
    pub async fn insert_deal(
        &self,
        contact_id: ContactId,
        estimated_value: Option<Decimal>,
    ) -> StoreResult<i64> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO deals (contact_id, estimated_value) VALUES (?1, ?2)",
                params![contact_id, estimated_value.map(|v| v.to_string())],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    /// Write a contact and all of its related rows in one transaction.
    ///
    /// Related row ids from the record are not preserved; the database assigns them.
    pub async fn insert_record(&self, record: &ContactRecord) -> StoreResult<()> {
        let record = record.clone();
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            write_contact(&tx, &record.contact)?;
            let id = record.contact.id;

            for name in &record.tags {
                let tag_id = ensure_tag(&tx, name)?;
                tx.execute(
                    "INSERT OR IGNORE INTO contact_tags (contact_id, tag_id) VALUES (?1, ?2)",
                    params![id, tag_id],
                )?;
            }
            for interaction in &record.interactions {
                tx.execute(
                    "INSERT INTO interactions (contact_id, type, date) VALUES (?1, ?2, ?3)",
                    params![
                        id,
                        interaction.interaction_type.code(),
                        interaction.date.timestamp_micros()
                    ],
                )?;
            }
            for deal in &record.deals {
                tx.execute(
                    "INSERT INTO deals (contact_id, estimated_value) VALUES (?1, ?2)",
                    params![id, deal.estimated_value.map(|v| v.to_string())],
                )?;
            }

            tx.commit()?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl ContactStore for SqliteContactStore {
    async fn count(&self, query: &ContactQuery) -> StoreResult<usize> {
        let (where_sql, values) = where_clause(&query.filter);
        let sql = format!("SELECT COUNT(*) FROM contacts c{}", where_sql);

        self.with_conn(move |conn| {
            let count: i64 = conn.query_row(&sql, params_from_iter(values.iter()), |row| {
                row.get(0)
            })?;
            Ok(count.max(0) as usize)
        })
        .await
    }

    async fn fetch(
        &self,
        query: &ContactQuery,
        window: Option<PageWindow>,
    ) -> StoreResult<Vec<ContactRecord>> {
        let (where_sql, mut values) = where_clause(&query.filter);
        let mut sql = format!(
            "SELECT {} FROM contacts c{} ORDER BY {}",
            CONTACT_COLUMNS,
            where_sql,
            order_by(&query.sort)
        );
        if let Some(w) = window {
            sql.push_str(" LIMIT ? OFFSET ?");
            values.push(Value::Integer(w.limit as i64));
            values.push(Value::Integer(w.offset as i64));
        }

        self.with_conn(move |conn| {
            let contacts = {
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params_from_iter(values.iter()), ContactRow::read)?;
                let mut contacts = Vec::new();
                for row in rows {
                    contacts.push(row?.into_contact()?);
                }
                contacts
            };
            load_related(conn, contacts)
        })
        .await
    }
}

/// Build ` WHERE ...` (or an empty string) and its bound values.
fn where_clause(filter: &ContactFilter) -> (String, Vec<Value>) {
    let mut conditions: Vec<String> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(city) = &filter.city {
        conditions.push("c.city = ?".to_string());
        values.push(Value::Text(city.clone()));
    }
    if !filter.any_tags.is_empty() {
        conditions.push(format!(
            "EXISTS (SELECT 1 FROM contact_tags ct JOIN tags t ON t.id = ct.tag_id \
             WHERE ct.contact_id = c.id AND t.name IN ({}))",
            placeholders(filter.any_tags.len())
        ));
        values.extend(filter.any_tags.iter().cloned().map(Value::Text));
    }
    if let Some(before) = filter.last_contact_before {
        conditions.push("c.last_contact_date < ?".to_string());
        values.push(Value::Integer(before.timestamp_micros()));
    }
    if let Some(stage) = filter.deal_stage {
        conditions.push("c.deal_stage = ?".to_string());
        values.push(Value::Integer(stage.code()));
    }

    if conditions.is_empty() {
        (String::new(), values)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), values)
    }
}

/// `ORDER BY` body. Default BINARY collation compares bytes, like `String::cmp`.
fn order_by(sort: &SortSpec) -> String {
    let column = match sort.field {
        SortField::FullName => "(c.first_name || ' ' || c.last_name)",
        SortField::Company => "c.company",
        SortField::Email => "c.email",
        SortField::LastContactDate => "c.last_contact_date",
    };
    let direction = if sort.descending { "DESC" } else { "ASC" };
    format!("{} {}, c.id ASC", column, direction)
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn write_contact(conn: &Connection, contact: &Contact) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO contacts
         (id, first_name, last_name, email, company, city, last_contact_date,
          deal_stage, base_potential_value)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(id) DO UPDATE SET
            first_name = excluded.first_name,
            last_name = excluded.last_name,
            email = excluded.email,
            company = excluded.company,
            city = excluded.city,
            last_contact_date = excluded.last_contact_date,
            deal_stage = excluded.deal_stage,
            base_potential_value = excluded.base_potential_value",
        params![
            contact.id,
            contact.first_name,
            contact.last_name,
            contact.email,
            contact.company,
            contact.city,
            contact.last_contact_date.timestamp_micros(),
            contact.deal_stage.map(DealStage::code),
            contact.base_potential_value.map(|v| v.to_string()),
        ],
    )?;
    Ok(())
}

fn ensure_tag(conn: &Connection, name: &str) -> StoreResult<i64> {
    conn.execute("INSERT OR IGNORE INTO tags (name) VALUES (?1)", params![name])?;
    let id: Option<i64> = conn
        .query_row("SELECT id FROM tags WHERE name = ?1", params![name], |row| {
            row.get(0)
        })
        .optional()?;
    id.ok_or_else(|| StoreError::Other(format!("tag '{}' vanished after insert", name)))
}

/// Attach tags, interactions and deals to `contacts`, preserving their order.
fn load_related(conn: &Connection, contacts: Vec<Contact>) -> StoreResult<Vec<ContactRecord>> {
    let ids: Vec<ContactId> = contacts.iter().map(|c| c.id).collect();
    let mut tags: HashMap<ContactId, Vec<String>> = HashMap::new();
    let mut interactions: HashMap<ContactId, Vec<Interaction>> = HashMap::new();
    let mut deals: HashMap<ContactId, Vec<Deal>> = HashMap::new();

    for chunk in ids.chunks(ID_CHUNK) {
        let marks = placeholders(chunk.len());

        let mut stmt = conn.prepare(&format!(
            "SELECT ct.contact_id, t.name FROM contact_tags ct
             JOIN tags t ON t.id = ct.tag_id
             WHERE ct.contact_id IN ({}) ORDER BY ct.rowid",
            marks
        ))?;
        let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| {
            Ok((row.get::<_, ContactId>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (contact_id, name) = row?;
            tags.entry(contact_id).or_default().push(name);
        }

        let mut stmt = conn.prepare(&format!(
            "SELECT id, contact_id, type, date FROM interactions
             WHERE contact_id IN ({}) ORDER BY id",
            marks
        ))?;
        let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, ContactId>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?;
        for row in rows {
            let (id, contact_id, kind, date) = row?;
            interactions.entry(contact_id).or_default().push(Interaction {
                id,
                contact_id,
                interaction_type: InteractionType::from_code(kind),
                date: from_micros("interactions", date)?,
            });
        }

        let mut stmt = conn.prepare(&format!(
            "SELECT id, contact_id, estimated_value FROM deals
             WHERE contact_id IN ({}) ORDER BY id",
            marks
        ))?;
        let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, ContactId>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })?;
        for row in rows {
            let (id, contact_id, value) = row?;
            deals.entry(contact_id).or_default().push(Deal {
                id,
                contact_id,
                estimated_value: parse_decimal("deals", value)?,
            });
        }
    }

    Ok(contacts
        .into_iter()
        .map(|contact| ContactRecord {
            tags: tags.remove(&contact.id).unwrap_or_default(),
            interactions: interactions.remove(&contact.id).unwrap_or_default(),
            deals: deals.remove(&contact.id).unwrap_or_default(),
            contact,
        })
        .collect())
}

/// Contact columns as stored, before decoding.
struct ContactRow {
    id: ContactId,
    first_name: String,
    last_name: String,
    email: String,
    company: String,
    city: String,
    last_contact_date: i64,
    deal_stage: Option<i64>,
    base_potential_value: Option<String>,
}

impl ContactRow {
    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            email: row.get(3)?,
            company: row.get(4)?,
            city: row.get(5)?,
            last_contact_date: row.get(6)?,
            deal_stage: row.get(7)?,
            base_potential_value: row.get(8)?,
        })
    }

    fn into_contact(self) -> StoreResult<Contact> {
        let deal_stage = match self.deal_stage {
            Some(code) => Some(DealStage::from_code(code).ok_or_else(|| StoreError::Corrupt {
                table: "contacts".to_string(),
                reason: format!("contact {} has unknown deal stage {}", self.id, code),
            })?),
            None => None,
        };

        Ok(Contact {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            company: self.company,
            city: self.city,
            last_contact_date: from_micros("contacts", self.last_contact_date)?,
            deal_stage,
            base_potential_value: parse_decimal("contacts", self.base_potential_value)?,
        })
    }
}

fn from_micros(table: &str, micros: i64) -> StoreResult<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros).ok_or_else(|| StoreError::Corrupt {
        table: table.to_string(),
        reason: format!("timestamp {} out of range", micros),
    })
}

fn parse_decimal(table: &str, value: Option<String>) -> StoreResult<Option<Decimal>> {
    value
        .map(|v| {
            Decimal::from_str(&v).map_err(|e| StoreError::Corrupt {
                table: table.to_string(),
                reason: format!("bad decimal '{}': {}", v, e),
            })
        })
        .transpose()
}
