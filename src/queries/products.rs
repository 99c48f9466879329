use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use crate::{
    commands::{DomainLogic, Entity, Error},
    domain::{Product, ValidationError},
    ports::database::{self, DatabasePort},
};
use tower::Service;
use uuid::Uuid;

/// One page of the product catalog
#[derive(Clone, Copy, Debug)]
pub struct ListProductsRequest {
    /// 1-based page number
    pub page: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProductListing {
    /// Total number of products
    pub count: usize,
    pub page: usize,
    /// Whether a page exists after this one
    pub has_next: bool,
    pub products: Vec<Product>,
}

#[derive(Clone, Copy, Debug)]
pub struct GetProductRequest {
    pub product_id: Uuid,
}

impl<D> Service<ListProductsRequest> for DomainLogic<D>
where
    D: DatabasePort + Send + Sync + 'static,
{
    type Response = ProductListing;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ListProductsRequest) -> Self::Future {
        let database = self.database();
        let page_size = self.config().page_size.get();
        Box::pin(async move {
            if req.page == 0 {
                return Err(ValidationError::new("page", "pages start at 1").into());
            }
            let offset = (req.page - 1).saturating_mul(page_size);
            let page = database.list_products(offset, page_size).await?;

            Ok(ProductListing {
                count: page.count,
                page: req.page,
                has_next: offset.saturating_add(page_size) < page.count,
                products: page.products,
            })
        })
    }
}

impl<D> Service<GetProductRequest> for DomainLogic<D>
where
    D: DatabasePort + Send + Sync + 'static,
{
    type Response = Product;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: GetProductRequest) -> Self::Future {
        let database = self.database();
        Box::pin(async move {
            // The product is the addressed entity here, not a reference
            database
                .get_product(req.product_id)
                .await
                .map_err(|err| match err {
                    database::Error::ProductNotFound(id) => Error::NotFound {
                        entity: Entity::Product,
                        id,
                    },
                    err => err.into(),
                })
        })
    }
}
