//! Business logic services

pub mod borrowing;
pub mod catalog;
pub mod identity;
pub mod users;
pub mod wishlist;

use crate::{config::AppConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub repository: Repository,
    pub catalog: catalog::CatalogService,
    pub borrowing: borrowing::BorrowingService,
    pub wishlist: wishlist::WishlistService,
    pub users: users::UsersService,
    pub identity: identity::IdentityService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            borrowing: borrowing::BorrowingService::new(
                repository.clone(),
                config.borrowing.clone(),
            ),
            wishlist: wishlist::WishlistService::new(repository.clone()),
            users: users::UsersService::new(repository.clone()),
            identity: identity::IdentityService::new(repository.clone(), config.auth.clone()),
            repository,
        }
    }
}
