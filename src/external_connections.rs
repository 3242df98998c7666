use sqlx::PgConnection;

/// A live database connection loaned out by an [ExternalConnectivity] implementation.
pub trait ConnectionHandle {
    fn borrow_connection(&mut self) -> &mut PgConnection;
}

/// ExternalConnectivity is the domain's window to the outside world. Driven port
/// implementations acquire their database connections through it, which lets unit
/// tests substitute a fake that never touches real infrastructure.
pub trait ExternalConnectivity: Sync {
    type Handle<'cxn>: ConnectionHandle + Send
    where
        Self: 'cxn;

    async fn database_cxn(&mut self) -> Result<Self::Handle<'_>, anyhow::Error>;
}
