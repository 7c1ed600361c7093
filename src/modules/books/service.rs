use bookshop_db::DbPool;
use bookshop_http::{Page, Pageable};
use sqlx::SqliteConnection;

use super::models::{Book, BookRequest, BookSummary};
use super::repository::{self, NewBook};
use crate::error::{ShopError, ShopResult};
use crate::modules::{cart, categories};
use crate::utils::non_blank;

const DUPLICATE_ISBN: &str = "Book with this isbn already exists";

/// Catalog reads and admin mutations.
#[derive(Clone)]
pub struct BookService {
    db: DbPool,
}

impl BookService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub async fn find_all(&self, pageable: Pageable) -> ShopResult<Page<Book>> {
        let mut conn = self.db.acquire().await?;
        let rows = repository::find_all(&mut conn, pageable).await?;
        let total = repository::count(&mut conn).await?;

        let mut books = Vec::with_capacity(rows.len());
        for row in rows {
            let category_ids = repository::category_ids(&mut conn, row.id).await?;
            books.push(row.into_summary()?.with_categories(category_ids));
        }
        Ok(Page::new(books, pageable, total))
    }

    pub async fn find_by_id(&self, id: i64) -> ShopResult<Book> {
        let mut conn = self.db.acquire().await?;
        load_book(&mut conn, id).await
    }

    /// Books assigned to an existing category.
    pub async fn find_by_category(
        &self,
        category_id: i64,
        pageable: Pageable,
    ) -> ShopResult<Page<BookSummary>> {
        let mut conn = self.db.acquire().await?;
        if categories::repository::find_by_id(&mut conn, category_id)
            .await?
            .is_none()
        {
            return Err(category_not_found(category_id));
        }

        let rows = repository::find_books_by_category(&mut conn, category_id, pageable).await?;
        let total = repository::count_by_category(&mut conn, category_id).await?;
        let items = rows
            .into_iter()
            .map(|row| row.into_summary())
            .collect::<ShopResult<Vec<_>>>()?;
        Ok(Page::new(items, pageable, total))
    }

    pub async fn save(&self, request: BookRequest) -> ShopResult<Book> {
        let fields = Fields::from_request(&request);
        let category_ids = normalized(&request.category_ids);

        let mut tx = self.db.begin().await?;
        ensure_categories_exist(&mut tx, &category_ids).await?;
        let id = repository::insert(&mut tx, &fields.as_new_book(&request))
            .await
            .map_err(|err| ShopError::from_write(err, DUPLICATE_ISBN))?;
        repository::set_categories(&mut tx, id, &category_ids).await?;
        let book = load_book(&mut tx, id).await?;
        tx.commit().await?;

        tracing::info!(book_id = id, isbn = %book.isbn, "book created");
        Ok(book)
    }

    pub async fn update(&self, id: i64, request: BookRequest) -> ShopResult<Book> {
        let fields = Fields::from_request(&request);
        let category_ids = normalized(&request.category_ids);

        let mut tx = self.db.begin().await?;
        ensure_categories_exist(&mut tx, &category_ids).await?;
        let updated = repository::update(&mut tx, id, &fields.as_new_book(&request))
            .await
            .map_err(|err| ShopError::from_write(err, DUPLICATE_ISBN))?;
        if !updated {
            return Err(book_not_found(id));
        }
        repository::set_categories(&mut tx, id, &category_ids).await?;
        let book = load_book(&mut tx, id).await?;
        tx.commit().await?;

        tracing::info!(book_id = id, "book updated");
        Ok(book)
    }

    /// Soft delete. The book also leaves every cart it was sitting in.
    pub async fn delete(&self, id: i64) -> ShopResult<()> {
        let mut tx = self.db.begin().await?;
        if !repository::soft_delete(&mut tx, id).await? {
            return Err(book_not_found(id));
        }
        let removed = cart::repository::remove_book_from_carts(&mut tx, id).await?;
        tx.commit().await?;

        tracing::info!(book_id = id, cart_lines_removed = removed, "book deleted");
        Ok(())
    }
}

/// Trimmed optional text of a request.
struct Fields {
    description: Option<String>,
    cover_image: Option<String>,
}

impl Fields {
    fn from_request(request: &BookRequest) -> Self {
        Self {
            description: non_blank(request.description.clone()),
            cover_image: non_blank(request.cover_image.clone()),
        }
    }

    fn as_new_book<'a>(&'a self, request: &'a BookRequest) -> NewBook<'a> {
        NewBook {
            title: request.title.trim(),
            author: request.author.trim(),
            isbn: request.isbn.trim(),
            price: request.price,
            description: self.description.as_deref(),
            cover_image: self.cover_image.as_deref(),
        }
    }
}

async fn load_book(conn: &mut SqliteConnection, id: i64) -> ShopResult<Book> {
    let row = repository::find_book_by_id(conn, id)
        .await?
        .ok_or_else(|| book_not_found(id))?;
    let category_ids = repository::category_ids(conn, id).await?;
    Ok(row.into_summary()?.with_categories(category_ids))
}

async fn ensure_categories_exist(conn: &mut SqliteConnection, ids: &[i64]) -> ShopResult<()> {
    for id in ids {
        if categories::repository::find_by_id(conn, *id).await?.is_none() {
            return Err(category_not_found(*id));
        }
    }
    Ok(())
}

fn normalized(ids: &[i64]) -> Vec<i64> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

pub(crate) fn book_not_found(id: i64) -> ShopError {
    ShopError::not_found(format!("Can't find book by id: {id}"))
}

fn category_not_found(id: i64) -> ShopError {
    ShopError::not_found(format!("Can't find category by id: {id}"))
}
