//! Shared mocks and fixtures for the engine's unit tests

use async_trait::async_trait;
use core_catalog::error::Result as CatalogResult;
use core_catalog::models::{Author, AuthorMetadata, Book, BookFile, HistoryRecord, ImportListExclusion};
use core_catalog::repositories::{
    AuthorRepository, BookFileRepository, BookRepository, ExclusionRepository, HistoryRepository,
};
use core_metadata::error::Result as ProviderResult;
use core_metadata::provider::{MetadataProvider, RemoteAuthor, RemoteBook};
use mockall::mock;

// `find_by_foreign_id` takes `Option<&str>`, a reference inside a generic
// type, which mockall cannot mock through an `#[async_trait]` impl block.
// The methods are mocked as inherent sync methods (same `expect_*` API) and
// the trait impl below delegates to them.
mock! {
    pub AuthorRepo {
        pub fn find_by_id(&self, id: &str) -> CatalogResult<Option<Author>>;
        pub fn find_by_foreign_id<'a>(
            &self,
            foreign_author_id: &str,
            exclude_author_id: Option<&'a str>,
        ) -> CatalogResult<Option<Author>>;
        pub fn get_metadata(&self, metadata_id: &str) -> CatalogResult<Option<AuthorMetadata>>;
        pub fn insert(&self, author: &Author, metadata: &AuthorMetadata) -> CatalogResult<()>;
        pub fn update(&self, author: &Author, metadata: &AuthorMetadata) -> CatalogResult<Author>;
        pub fn delete(&self, id: &str, delete_files: bool, delete_from_disk: bool) -> CatalogResult<bool>;
    }
}

#[async_trait]
impl AuthorRepository for MockAuthorRepo {
    async fn find_by_id(&self, id: &str) -> CatalogResult<Option<Author>> {
        MockAuthorRepo::find_by_id(self, id)
    }
    async fn find_by_foreign_id(
        &self,
        foreign_author_id: &str,
        exclude_author_id: Option<&str>,
    ) -> CatalogResult<Option<Author>> {
        MockAuthorRepo::find_by_foreign_id(self, foreign_author_id, exclude_author_id)
    }
    async fn get_metadata(&self, metadata_id: &str) -> CatalogResult<Option<AuthorMetadata>> {
        MockAuthorRepo::get_metadata(self, metadata_id)
    }
    async fn insert(&self, author: &Author, metadata: &AuthorMetadata) -> CatalogResult<()> {
        MockAuthorRepo::insert(self, author, metadata)
    }
    async fn update(&self, author: &Author, metadata: &AuthorMetadata) -> CatalogResult<Author> {
        MockAuthorRepo::update(self, author, metadata)
    }
    async fn delete(&self, id: &str, delete_files: bool, delete_from_disk: bool) -> CatalogResult<bool> {
        MockAuthorRepo::delete(self, id, delete_files, delete_from_disk)
    }
}

mock! {
    pub BookRepo {}

    #[async_trait]
    impl BookRepository for BookRepo {
        async fn find_by_id(&self, id: &str) -> CatalogResult<Option<Book>>;
        async fn get_by_author_metadata(&self, author_metadata_id: &str) -> CatalogResult<Vec<Book>>;
        async fn get_for_refresh(
            &self,
            author_id: &str,
            excluded_foreign_ids: &[String],
        ) -> CatalogResult<Vec<Book>>;
        async fn insert_many(&self, books: &[Book]) -> CatalogResult<()>;
        async fn update_many(&self, books: &[Book]) -> CatalogResult<()>;
    }
}

mock! {
    pub BookFileRepo {}

    #[async_trait]
    impl BookFileRepository for BookFileRepo {
        async fn get_by_author(&self, author_id: &str) -> CatalogResult<Vec<BookFile>>;
        async fn count_by_author(&self, author_id: &str) -> CatalogResult<i64>;
        async fn insert(&self, file: &BookFile) -> CatalogResult<()>;
        async fn reassign_author(&self, from_author_id: &str, to_author_id: &str) -> CatalogResult<u64>;
    }
}

mock! {
    pub HistoryRepo {}

    #[async_trait]
    impl HistoryRepository for HistoryRepo {
        async fn insert(&self, record: &HistoryRecord) -> CatalogResult<()>;
        async fn get_by_author(&self, author_id: &str) -> CatalogResult<Vec<HistoryRecord>>;
        async fn removed_foreign_book_ids(&self, author_id: &str) -> CatalogResult<Vec<String>>;
        async fn reassign_author(&self, from_author_id: &str, to_author_id: &str) -> CatalogResult<u64>;
    }
}

mock! {
    pub ExclusionRepo {}

    #[async_trait]
    impl ExclusionRepository for ExclusionRepo {
        async fn insert(&self, exclusion: &ImportListExclusion) -> CatalogResult<()>;
        async fn all(&self) -> CatalogResult<Vec<ImportListExclusion>>;
        async fn foreign_ids(&self) -> CatalogResult<Vec<String>>;
    }
}

mock! {
    pub Provider {}

    #[async_trait]
    impl MetadataProvider for Provider {
        async fn resolve_author(&self, foreign_author_id: &str) -> ProviderResult<RemoteAuthor>;
    }
}

/// An author plus its owned metadata record, both carrying `foreign_id`.
pub fn author_with_foreign_id(foreign_id: &str) -> (Author, AuthorMetadata) {
    let metadata = AuthorMetadata::new(foreign_id, "Jane Author");
    let author = Author::new(foreign_id, metadata.id.clone(), "/books");
    (author, metadata)
}

/// A provider payload resolving to `foreign_id` with the given books.
pub fn remote_author(foreign_id: &str, books: Vec<RemoteBook>) -> RemoteAuthor {
    RemoteAuthor {
        foreign_author_id: foreign_id.to_string(),
        name: "Jane Author".to_string(),
        sort_name: None,
        overview: None,
        status: "active".to_string(),
        images: Vec::new(),
        rating: None,
        rating_count: 0,
        books,
    }
}

/// A minimal remote book.
pub fn remote_book(foreign_book_id: &str, title: &str) -> RemoteBook {
    RemoteBook {
        foreign_book_id: foreign_book_id.to_string(),
        title: title.to_string(),
        title_slug: None,
        overview: None,
        release_date: None,
        release_type: None,
        rating: None,
        rating_count: 0,
    }
}
