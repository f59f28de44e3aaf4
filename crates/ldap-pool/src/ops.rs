//! Directory operations run directly on the pool.
//!
//! Each operation acquires a connection bounded by the configured
//! `operation_acquire_timeout`, runs one request on it and releases it on
//! every exit path. Client errors are returned unchanged as
//! [`PoolError::Operation`]; nothing is retried.

use ldap_proto::{
    AddRequest, Connector, DeleteRequest, ModifyDnRequest, ModifyRequest, ModifyResult, Operation,
    PasswordModifyRequest, PasswordModifyResult, Response, SearchRequest, SearchResult,
};

use crate::error::PoolError;
use crate::pool::Pool;

impl<C: Connector> Pool<C> {
    /// Run `operation` on a pooled connection.
    async fn run(&self, operation: Operation) -> Result<Response, PoolError> {
        let mut conn = self
            .acquire_timeout(self.config().operation_acquire_timeout)
            .await?;
        let response = conn.invoke(operation).await?;
        Ok(response)
    }

    /// Search the directory.
    pub async fn search(&self, request: SearchRequest) -> Result<SearchResult, PoolError> {
        match self.run(Operation::Search(request)).await? {
            Response::Search(result) => Ok(result),
            other => Err(unexpected("search", &other)),
        }
    }

    /// Search the directory, fetching results `page_size` entries at a time.
    pub async fn search_with_paging(
        &self,
        request: SearchRequest,
        page_size: u32,
    ) -> Result<SearchResult, PoolError> {
        let operation = Operation::SearchWithPaging { request, page_size };
        match self.run(operation).await? {
            Response::Search(result) => Ok(result),
            other => Err(unexpected("search_with_paging", &other)),
        }
    }

    /// Add an entry.
    pub async fn add(&self, request: AddRequest) -> Result<(), PoolError> {
        expect_done("add", self.run(Operation::Add(request)).await?)
    }

    /// Modify an entry.
    pub async fn modify(&self, request: ModifyRequest) -> Result<(), PoolError> {
        expect_done("modify", self.run(Operation::Modify(request)).await?)
    }

    /// Modify an entry and return the response controls.
    pub async fn modify_with_result(
        &self,
        request: ModifyRequest,
    ) -> Result<ModifyResult, PoolError> {
        match self.run(Operation::ModifyWithResult(request)).await? {
            Response::Modified(result) => Ok(result),
            other => Err(unexpected("modify_with_result", &other)),
        }
    }

    /// Rename or move an entry.
    pub async fn modify_dn(&self, request: ModifyDnRequest) -> Result<(), PoolError> {
        expect_done("modify_dn", self.run(Operation::ModifyDn(request)).await?)
    }

    /// Delete an entry.
    pub async fn delete(&self, request: DeleteRequest) -> Result<(), PoolError> {
        expect_done("delete", self.run(Operation::Delete(request)).await?)
    }

    /// Change a password through the password modify extended operation.
    pub async fn password_modify(
        &self,
        request: PasswordModifyRequest,
    ) -> Result<PasswordModifyResult, PoolError> {
        match self.run(Operation::PasswordModify(request)).await? {
            Response::PasswordModified(result) => Ok(result),
            other => Err(unexpected("password_modify", &other)),
        }
    }
}

fn expect_done(operation: &'static str, response: Response) -> Result<(), PoolError> {
    match response {
        Response::Done => Ok(()),
        other => Err(unexpected(operation, &other)),
    }
}

fn unexpected(operation: &'static str, response: &Response) -> PoolError {
    tracing::debug!(operation, response = response.kind(), "mismatched response");
    PoolError::UnexpectedResponse {
        operation,
        response: response.kind(),
    }
}
