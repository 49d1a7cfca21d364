//! Post repository implementation

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT/OFFSET

use crate::error::Result;
use crate::models::{split_tags, Post, PostQuery, SortOrder, TagFilter, Visibility};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

const POST_COLUMNS: &str = "href, title, description, hash, time, shared, toread, tags";

/// Trait for post storage operations
pub trait PostRepository {
    /// Number of posts matching the query's filter, capped by its `count_limit`
    fn count(&self, query: &PostQuery) -> Result<usize>;

    /// One page of posts matching the query's filter, in the query's order
    fn list(&self, query: &PostQuery) -> Result<Vec<Post>>;

    /// Get a post by url
    fn get(&self, url: &str) -> Result<Option<Post>>;

    /// Insert posts, overwriting rows with the same url
    fn save(&self, posts: &[Post]) -> Result<()>;

    /// Replace the whole table with the given posts in one transaction
    fn replace_all(&self, posts: &[Post]) -> Result<()>;

    /// Delete a post by url, returning whether a row was removed
    fn delete(&self, url: &str) -> Result<bool>;

    /// Delete every post, returning the number of rows removed
    fn delete_all(&self) -> Result<usize>;

    /// Raw tag strings of every post whose tags contain `term`
    fn search_tag_strings(&self, term: &str) -> Result<Vec<String>>;
}

/// `SQLite` implementation of `PostRepository`
pub struct SqlitePostRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqlitePostRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn insert_all(conn: &Connection, posts: &[Post]) -> Result<()> {
        let mut stmt = conn.prepare_cached(
            "INSERT OR REPLACE INTO posts (href, title, description, hash, time, shared, toread, tags)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )?;

        for post in posts {
            stmt.execute(params![
                post.url,
                post.title,
                post.description,
                post.hash,
                post.time,
                i32::from(!post.private),
                i32::from(post.read_later),
                post.tags_string(),
            ])?;
        }

        Ok(())
    }

    /// Parse a post from a database row
    fn parse_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<Post> {
        let tags: String = row.get(7)?;
        Ok(Post {
            url: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            hash: row.get(3)?,
            time: row.get(4)?,
            private: row.get::<_, i32>(5)? == 0,
            read_later: row.get::<_, i32>(6)? != 0,
            tags: split_tags(&tags),
        })
    }
}

/// Build the WHERE clause and its parameters for a query.
///
/// The count and list queries both go through here so their predicates can
/// never drift apart.
fn filter_clause(query: &PostQuery) -> (String, Vec<Value>) {
    let mut conditions: Vec<String> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    let term = query.search_term.trim();
    if !term.is_empty() {
        conditions.push(
            "(href LIKE ? ESCAPE '\\' OR title LIKE ? ESCAPE '\\' \
             OR description LIKE ? ESCAPE '\\' OR tags LIKE ? ESCAPE '\\')"
                .to_string(),
        );
        let pattern = format!("%{}%", escape_like(term));
        values.extend(std::iter::repeat(Value::Text(pattern)).take(4));
    }

    match &query.tags {
        TagFilter::None => {}
        TagFilter::Untagged => conditions.push("tags = ''".to_string()),
        TagFilter::Tagged(_) => {
            for tag in query.filter_tags() {
                conditions.push("(' ' || tags || ' ') LIKE ? ESCAPE '\\'".to_string());
                values.push(Value::Text(format!("% {} %", escape_like(tag))));
            }
        }
    }

    match query.visibility {
        Visibility::None => {}
        Visibility::Public => conditions.push("shared = 1".to_string()),
        Visibility::Private => conditions.push("shared = 0".to_string()),
    }

    if query.read_later_only {
        conditions.push("toread = 1".to_string());
    }

    if conditions.is_empty() {
        (String::new(), values)
    } else {
        (format!("WHERE {}", conditions.join(" AND ")), values)
    }
}

/// Escape `LIKE` wildcards so user input only matches literally.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

impl PostRepository for SqlitePostRepository<'_> {
    fn count(&self, query: &PostQuery) -> Result<usize> {
        let (clause, mut values) = filter_clause(query);
        let cap = query.count_limit.map_or(-1, |limit| limit as i64);
        values.push(Value::Integer(cap));

        let sql = format!("SELECT COUNT(*) FROM (SELECT 1 FROM posts {clause} LIMIT ?)");
        let count: i64 = self
            .conn
            .query_row(&sql, params_from_iter(values), |row| row.get(0))?;

        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn list(&self, query: &PostQuery) -> Result<Vec<Post>> {
        let (clause, mut values) = filter_clause(query);
        values.push(Value::Integer(query.limit as i64));
        values.push(Value::Integer(query.offset as i64));

        let order = match query.sort {
            SortOrder::NewestFirst => "time DESC, href ASC",
            SortOrder::OldestFirst => "time ASC, href ASC",
        };
        let sql =
            format!("SELECT {POST_COLUMNS} FROM posts {clause} ORDER BY {order} LIMIT ? OFFSET ?");

        let mut stmt = self.conn.prepare(&sql)?;
        let posts = stmt
            .query_map(params_from_iter(values), Self::parse_post)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(posts)
    }

    fn get(&self, url: &str) -> Result<Option<Post>> {
        let post = self
            .conn
            .query_row(
                &format!("SELECT {POST_COLUMNS} FROM posts WHERE href = ?"),
                params![url],
                Self::parse_post,
            )
            .optional()?;

        Ok(post)
    }

    fn save(&self, posts: &[Post]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        Self::insert_all(&tx, posts)?;
        tx.commit()?;
        Ok(())
    }

    fn replace_all(&self, posts: &[Post]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM posts", [])?;
        Self::insert_all(&tx, posts)?;
        tx.commit()?;
        Ok(())
    }

    fn delete(&self, url: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM posts WHERE href = ?", params![url])?;
        Ok(rows > 0)
    }

    fn delete_all(&self) -> Result<usize> {
        Ok(self.conn.execute("DELETE FROM posts", [])?)
    }

    fn search_tag_strings(&self, term: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT tags FROM posts WHERE tags LIKE ? ESCAPE '\\'")?;

        let tags = stmt
            .query_map(params![format!("%{}%", escape_like(term))], |row| {
                row.get::<_, String>(0)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(tags)
    }
}
