use bookshop_db::DbPool;
use bookshop_http::{Page, Pageable};

use super::models::{Category, CategoryRequest};
use super::repository;
use crate::error::{ShopError, ShopResult};
use crate::utils::non_blank;

#[derive(Clone)]
pub struct CategoryService {
    db: DbPool,
}

impl CategoryService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub async fn find_all(&self, pageable: Pageable) -> ShopResult<Page<Category>> {
        let mut conn = self.db.acquire().await?;
        let items = repository::find_all(&mut conn, pageable).await?;
        let total = repository::count(&mut conn).await?;
        Ok(Page::new(items, pageable, total))
    }

    pub async fn find_by_id(&self, id: i64) -> ShopResult<Category> {
        let mut conn = self.db.acquire().await?;
        repository::find_by_id(&mut conn, id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn save(&self, request: CategoryRequest) -> ShopResult<Category> {
        let description = non_blank(request.description);
        let mut conn = self.db.acquire().await?;
        let category =
            repository::insert(&mut conn, request.name.trim(), description.as_deref()).await?;
        tracing::info!(category_id = category.id, name = %category.name, "category created");
        Ok(category)
    }

    pub async fn update(&self, id: i64, request: CategoryRequest) -> ShopResult<Category> {
        let description = non_blank(request.description);
        let mut conn = self.db.acquire().await?;
        let category =
            repository::update(&mut conn, id, request.name.trim(), description.as_deref())
                .await?
                .ok_or_else(|| not_found(id))?;
        tracing::info!(category_id = id, "category updated");
        Ok(category)
    }

    /// Hard delete; book assignments cascade.
    pub async fn delete(&self, id: i64) -> ShopResult<()> {
        let mut conn = self.db.acquire().await?;
        if !repository::delete(&mut conn, id).await? {
            return Err(not_found(id));
        }
        tracing::info!(category_id = id, "category deleted");
        Ok(())
    }
}

fn not_found(id: i64) -> ShopError {
    ShopError::not_found(format!("Can't find category by id: {id}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    fn request(name: &str) -> CategoryRequest {
        CategoryRequest {
            name: name.into(),
            description: Some("".into()),
        }
    }

    #[tokio::test]
    async fn crud_round() {
        let state = test_support::state().await;
        let categories = state.categories();

        let fiction = categories.save(request(" Fiction ")).await.unwrap();
        assert_eq!(fiction.name, "Fiction");
        assert_eq!(fiction.description, None);

        let updated = categories
            .update(
                fiction.id,
                CategoryRequest {
                    name: "Novels".into(),
                    description: Some("Long prose".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Novels");
        assert_eq!(categories.find_by_id(fiction.id).await.unwrap(), updated);

        categories.delete(fiction.id).await.unwrap();
        assert!(matches!(
            categories.find_by_id(fiction.id).await,
            Err(ShopError::NotFound(_))
        ));
        assert!(matches!(categories.delete(fiction.id).await, Err(ShopError::NotFound(_))));
    }

    #[tokio::test]
    async fn listing_is_paged_by_name() {
        let state = test_support::state().await;
        let categories = state.categories();
        for name in ["Poetry", "Drama", "Essays"] {
            categories.save(request(name)).await.unwrap();
        }

        let page = categories.find_all(Pageable::new(0, 2)).await.unwrap();
        assert_eq!(page.total, 3);
        let names: Vec<_> = page.items.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Drama", "Essays"]);

        let rest = categories.find_all(Pageable::new(1, 2)).await.unwrap();
        assert_eq!(rest.items.len(), 1);
    }

    #[tokio::test]
    async fn updating_missing_category_is_not_found() {
        let state = test_support::state().await;
        let err = state.categories().update(404, request("Ghost")).await.unwrap_err();
        assert!(matches!(err, ShopError::NotFound(_)));
    }
}
