use crate::{
    entities::{category, product, Category, CategoryModel, Product, ProductModel},
    errors::ServiceError,
};
use sea_orm::{
    sea_query::{Expr, Func},
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

/// Products shown per listing page.
pub const PRODUCTS_PER_PAGE: u64 = 12;
/// Featured products / categories shown on the home page.
const HOME_PAGE_LIMIT: u64 = 6;
/// Related products shown on a product detail page.
const RELATED_PRODUCTS_LIMIT: u64 = 4;

/// Read-only catalog access: home page data, filtered listing, slug lookup.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Home page data: up to six featured products and six categories.
    #[instrument(skip(self))]
    pub async fn home_page(&self) -> Result<HomePage, ServiceError> {
        let featured_products = Product::find()
            .filter(product::Column::Featured.eq(true))
            .order_by_desc(product::Column::CreatedAt)
            .limit(HOME_PAGE_LIMIT)
            .all(&*self.db)
            .await?;

        let categories = Category::find()
            .order_by_asc(category::Column::Name)
            .limit(HOME_PAGE_LIMIT)
            .all(&*self.db)
            .await?;

        Ok(HomePage {
            featured_products,
            categories,
        })
    }

    /// Paginated product listing, optionally restricted to a category slug
    /// and/or a case-insensitive substring search over product name, product
    /// description and category name.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        filter: ProductFilter,
    ) -> Result<ProductPage, ServiceError> {
        let mut query = Product::find();

        let current_category = match filter.category.as_deref() {
            Some(slug) => {
                let cat = self.get_category_by_slug(slug).await?;
                query = query.filter(product::Column::CategoryId.eq(cat.id));
                Some(cat)
            }
            None => None,
        };

        if let Some(q) = filter.q.as_deref().filter(|q| !q.trim().is_empty()) {
            let needle = format!("%{}%", q.trim().to_lowercase());
            query = query
                .join(JoinType::InnerJoin, product::Relation::Category.def())
                .filter(
                    Condition::any()
                        .add(
                            Expr::expr(Func::lower(Expr::col((
                                product::Entity,
                                product::Column::Name,
                            ))))
                            .like(needle.clone()),
                        )
                        .add(
                            Expr::expr(Func::lower(Expr::col((
                                product::Entity,
                                product::Column::Description,
                            ))))
                            .like(needle.clone()),
                        )
                        .add(
                            Expr::expr(Func::lower(Expr::col((
                                category::Entity,
                                category::Column::Name,
                            ))))
                            .like(needle),
                        ),
                );
        }

        let page = filter.page.max(1);
        let paginator = query
            .order_by_desc(product::Column::CreatedAt)
            .paginate(&*self.db, PRODUCTS_PER_PAGE);

        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page - 1).await?;
        let total_pages = total.div_ceil(PRODUCTS_PER_PAGE);

        Ok(ProductPage {
            products,
            current_category,
            page,
            per_page: PRODUCTS_PER_PAGE,
            total,
            total_pages,
        })
    }

    /// Product detail: the product, its category and up to four related
    /// products from the same category.
    #[instrument(skip(self))]
    pub async fn get_product_by_slug(&self, slug: &str) -> Result<ProductDetail, ServiceError> {
        let product = Product::find()
            .filter(product::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product '{}' not found", slug)))?;

        let category = Category::find_by_id(product.category_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Category for product '{}' not found", slug))
            })?;

        let related_products = Product::find()
            .filter(product::Column::CategoryId.eq(product.category_id))
            .filter(product::Column::Id.ne(product.id))
            .order_by_desc(product::Column::CreatedAt)
            .limit(RELATED_PRODUCTS_LIMIT)
            .all(&*self.db)
            .await?;

        Ok(ProductDetail {
            product,
            category,
            related_products,
        })
    }

    pub async fn get_category_by_slug(&self, slug: &str) -> Result<CategoryModel, ServiceError> {
        Category::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category '{}' not found", slug)))
    }

    pub async fn list_categories(&self) -> Result<Vec<CategoryModel>, ServiceError> {
        Ok(Category::find()
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await?)
    }
}

/// Home page payload
#[derive(Debug, Serialize)]
pub struct HomePage {
    pub featured_products: Vec<ProductModel>,
    pub categories: Vec<CategoryModel>,
}

/// Listing filter
#[derive(Debug, Default, Deserialize)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub q: Option<String>,
    #[serde(default = "default_page")]
    pub page: u64,
}

fn default_page() -> u64 {
    1
}

/// One page of the product listing
#[derive(Debug, Serialize)]
pub struct ProductPage {
    pub products: Vec<ProductModel>,
    pub current_category: Option<CategoryModel>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub total_pages: u64,
}

/// Product detail payload
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    pub product: ProductModel,
    pub category: CategoryModel,
    pub related_products: Vec<ProductModel>,
}
