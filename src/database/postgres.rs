use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use super::models::{Audio, Category, Comment, Playlist, Role, User};
use super::repository::{Session, Store, StoreError, StoreResult};

const USER_COLUMNS: &str = "id, name, email, password, image, role, is_banned, playlists";
const AUDIO_COLUMNS: &str = "id, title, artist, track, image, views, likes, comments, category";
const CATEGORY_COLUMNS: &str = "id, name, tracks";
const PLAYLIST_COLUMNS: &str = "id, name, tracks, owner";
const COMMENT_COLUMNS: &str = "id, text, author";

/// Postgres SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL-backed store. Each collection is a table; reference lists are
/// `uuid[]` columns, and every session is one database transaction.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> StoreResult<Box<dyn Session>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgSession { tx }))
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

struct PgSession {
    tx: Transaction<'static, Postgres>,
}

fn user_from_row(row: &PgRow) -> StoreResult<User> {
    let role: String = row.try_get("role")?;
    let role = role.parse::<Role>().map_err(|e| StoreError::Corrupt {
        collection: "users",
        detail: e.to_string(),
    })?;

    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password: row.try_get("password")?,
        image: row.try_get("image")?,
        role,
        is_banned: row.try_get("is_banned")?,
        playlists: row.try_get("playlists")?,
    })
}

fn audio_from_row(row: &PgRow) -> StoreResult<Audio> {
    Ok(Audio {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        artist: row.try_get("artist")?,
        track: row.try_get("track")?,
        image: row.try_get("image")?,
        views: row.try_get("views")?,
        likes: row.try_get("likes")?,
        comments: row.try_get("comments")?,
        category: row.try_get("category")?,
    })
}

fn category_from_row(row: &PgRow) -> StoreResult<Category> {
    Ok(Category {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        tracks: row.try_get("tracks")?,
    })
}

fn playlist_from_row(row: &PgRow) -> StoreResult<Playlist> {
    Ok(Playlist {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        tracks: row.try_get("tracks")?,
        owner: row.try_get("owner")?,
    })
}

fn comment_from_row(row: &PgRow) -> StoreResult<Comment> {
    Ok(Comment {
        id: row.try_get("id")?,
        text: row.try_get("text")?,
        author: row.try_get("author")?,
    })
}

fn map_rows<T>(rows: Vec<PgRow>, f: fn(&PgRow) -> StoreResult<T>) -> StoreResult<Vec<T>> {
    rows.iter().map(f).collect()
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some(UNIQUE_VIOLATION),
        _ => false,
    }
}

#[async_trait]
impl Session for PgSession {
    async fn user(&mut self, id: Uuid) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query(&sql).bind(id).fetch_optional(&mut *self.tx).await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn user_by_email(&mut self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let row = sqlx::query(&sql).bind(email).fetch_optional(&mut *self.tx).await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn users(&mut self) -> StoreResult<Vec<User>> {
        let sql = format!("SELECT {} FROM users ORDER BY seq", USER_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&mut *self.tx).await?;
        map_rows(rows, user_from_row)
    }

    async fn insert_user(&mut self, user: &User) -> StoreResult<()> {
        let result = sqlx::query(
            "INSERT INTO users (id, name, email, password, image, role, is_banned, playlists) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.image)
        .bind(user.role.as_str())
        .bind(user.is_banned)
        .bind(&user.playlists)
        .execute(&mut *self.tx)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(StoreError::DuplicateEmail(user.email.clone())),
            Err(e) => Err(e.into()),
        }
    }

    async fn update_user(&mut self, user: &User) -> StoreResult<()> {
        sqlx::query("UPDATE users SET name = $2, image = $3, role = $4, is_banned = $5 WHERE id = $1")
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.image)
            .bind(user.role.as_str())
            .bind(user.is_banned)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn push_user_playlist(&mut self, user: Uuid, playlist: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE users SET playlists = array_append(playlists, $2) WHERE id = $1")
            .bind(user)
            .bind(playlist)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn pull_user_playlist(&mut self, user: Uuid, playlist: Uuid) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET playlists = array_remove(playlists, $2) WHERE id = $1 AND $2 = ANY(playlists)",
        )
        .bind(user)
        .bind(playlist)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn audio(&mut self, id: Uuid) -> StoreResult<Option<Audio>> {
        let sql = format!("SELECT {} FROM audios WHERE id = $1", AUDIO_COLUMNS);
        let row = sqlx::query(&sql).bind(id).fetch_optional(&mut *self.tx).await?;
        row.as_ref().map(audio_from_row).transpose()
    }

    async fn audios(&mut self) -> StoreResult<Vec<Audio>> {
        let sql = format!("SELECT {} FROM audios ORDER BY seq", AUDIO_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&mut *self.tx).await?;
        map_rows(rows, audio_from_row)
    }

    async fn audios_by_ids(&mut self, ids: &[Uuid]) -> StoreResult<Vec<Audio>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let sql = format!(
            "SELECT {} FROM audios WHERE id = ANY($1) ORDER BY array_position($1, id)",
            AUDIO_COLUMNS
        );
        let rows = sqlx::query(&sql).bind(ids).fetch_all(&mut *self.tx).await?;
        map_rows(rows, audio_from_row)
    }

    async fn audios_by_title(&mut self, title: &str) -> StoreResult<Vec<Audio>> {
        let sql = format!("SELECT {} FROM audios WHERE title = $1 ORDER BY seq", AUDIO_COLUMNS);
        let rows = sqlx::query(&sql).bind(title).fetch_all(&mut *self.tx).await?;
        map_rows(rows, audio_from_row)
    }

    async fn insert_audio(&mut self, audio: &Audio) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO audios (id, title, artist, track, image, views, likes, comments, category) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(audio.id)
        .bind(&audio.title)
        .bind(&audio.artist)
        .bind(&audio.track)
        .bind(&audio.image)
        .bind(audio.views)
        .bind(audio.likes)
        .bind(&audio.comments)
        .bind(audio.category)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn update_audio(&mut self, audio: &Audio) -> StoreResult<()> {
        sqlx::query(
            "UPDATE audios SET title = $2, artist = $3, track = $4, image = $5, category = $6 \
             WHERE id = $1",
        )
        .bind(audio.id)
        .bind(&audio.title)
        .bind(&audio.artist)
        .bind(&audio.track)
        .bind(&audio.image)
        .bind(audio.category)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn push_audio_comment(&mut self, audio: Uuid, comment: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE audios SET comments = array_append(comments, $2) WHERE id = $1")
            .bind(audio)
            .bind(comment)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn increment_views(&mut self, id: Uuid) -> StoreResult<Option<Audio>> {
        let sql = format!(
            "UPDATE audios SET views = views + 1 WHERE id = $1 RETURNING {}",
            AUDIO_COLUMNS
        );
        let row = sqlx::query(&sql).bind(id).fetch_optional(&mut *self.tx).await?;
        row.as_ref().map(audio_from_row).transpose()
    }

    async fn increment_likes(&mut self, id: Uuid) -> StoreResult<Option<Audio>> {
        let sql = format!(
            "UPDATE audios SET likes = likes + 1 WHERE id = $1 RETURNING {}",
            AUDIO_COLUMNS
        );
        let row = sqlx::query(&sql).bind(id).fetch_optional(&mut *self.tx).await?;
        row.as_ref().map(audio_from_row).transpose()
    }

    async fn delete_audios(&mut self, ids: &[Uuid]) -> StoreResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("DELETE FROM audios WHERE id = ANY($1)")
            .bind(ids)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn category(&mut self, id: Uuid) -> StoreResult<Option<Category>> {
        let sql = format!("SELECT {} FROM categories WHERE id = $1", CATEGORY_COLUMNS);
        let row = sqlx::query(&sql).bind(id).fetch_optional(&mut *self.tx).await?;
        row.as_ref().map(category_from_row).transpose()
    }

    async fn categories(&mut self) -> StoreResult<Vec<Category>> {
        let sql = format!("SELECT {} FROM categories ORDER BY seq", CATEGORY_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&mut *self.tx).await?;
        map_rows(rows, category_from_row)
    }

    async fn insert_category(&mut self, category: &Category) -> StoreResult<()> {
        sqlx::query("INSERT INTO categories (id, name, tracks) VALUES ($1, $2, $3)")
            .bind(category.id)
            .bind(&category.name)
            .bind(&category.tracks)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn update_category(&mut self, category: &Category) -> StoreResult<()> {
        sqlx::query("UPDATE categories SET name = $2 WHERE id = $1")
            .bind(category.id)
            .bind(&category.name)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn push_category_track(&mut self, category: Uuid, track: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE categories SET tracks = array_append(tracks, $2) WHERE id = $1")
            .bind(category)
            .bind(track)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_category(&mut self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn pull_track_from_categories(&mut self, track: Uuid) -> StoreResult<u64> {
        let result = sqlx::query(
            "UPDATE categories SET tracks = array_remove(tracks, $1) WHERE $1 = ANY(tracks)",
        )
        .bind(track)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn playlist(&mut self, id: Uuid) -> StoreResult<Option<Playlist>> {
        let sql = format!("SELECT {} FROM playlists WHERE id = $1", PLAYLIST_COLUMNS);
        let row = sqlx::query(&sql).bind(id).fetch_optional(&mut *self.tx).await?;
        row.as_ref().map(playlist_from_row).transpose()
    }

    async fn playlists_by_ids(&mut self, ids: &[Uuid]) -> StoreResult<Vec<Playlist>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let sql = format!(
            "SELECT {} FROM playlists WHERE id = ANY($1) ORDER BY array_position($1, id)",
            PLAYLIST_COLUMNS
        );
        let rows = sqlx::query(&sql).bind(ids).fetch_all(&mut *self.tx).await?;
        map_rows(rows, playlist_from_row)
    }

    async fn playlist_by_owner_and_name(&mut self, owner: Uuid, name: &str) -> StoreResult<Option<Playlist>> {
        let sql = format!(
            "SELECT {} FROM playlists WHERE owner = $1 AND name = $2 ORDER BY seq LIMIT 1",
            PLAYLIST_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(owner)
            .bind(name)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(playlist_from_row).transpose()
    }

    async fn insert_playlist(&mut self, playlist: &Playlist) -> StoreResult<()> {
        sqlx::query("INSERT INTO playlists (id, name, tracks, owner) VALUES ($1, $2, $3, $4)")
            .bind(playlist.id)
            .bind(&playlist.name)
            .bind(&playlist.tracks)
            .bind(playlist.owner)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn update_playlist(&mut self, playlist: &Playlist) -> StoreResult<()> {
        sqlx::query("UPDATE playlists SET name = $2 WHERE id = $1")
            .bind(playlist.id)
            .bind(&playlist.name)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn push_playlist_track(&mut self, playlist: Uuid, track: Uuid) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE playlists SET tracks = array_append(tracks, $2) \
             WHERE id = $1 AND NOT ($2 = ANY(tracks))",
        )
        .bind(playlist)
        .bind(track)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_playlist(&mut self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM playlists WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn pull_track_from_playlists(&mut self, track: Uuid) -> StoreResult<u64> {
        let result = sqlx::query(
            "UPDATE playlists SET tracks = array_remove(tracks, $1) WHERE $1 = ANY(tracks)",
        )
        .bind(track)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn comments_by_ids(&mut self, ids: &[Uuid]) -> StoreResult<Vec<Comment>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let sql = format!(
            "SELECT {} FROM comments WHERE id = ANY($1) ORDER BY array_position($1, id)",
            COMMENT_COLUMNS
        );
        let rows = sqlx::query(&sql).bind(ids).fetch_all(&mut *self.tx).await?;
        map_rows(rows, comment_from_row)
    }

    async fn insert_comment(&mut self, comment: &Comment) -> StoreResult<()> {
        sqlx::query("INSERT INTO comments (id, text, author) VALUES ($1, $2, $3)")
            .bind(comment.id)
            .bind(&comment.text)
            .bind(comment.author)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn delete_comments(&mut self, ids: &[Uuid]) -> StoreResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("DELETE FROM comments WHERE id = ANY($1)")
            .bind(ids)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
