use crate::{MetadataProvider, ProviderError, RemoteMetadata, UploadFile};

#[derive(Debug, Default)]
pub struct NoopProvider;

#[async_trait::async_trait]
impl MetadataProvider for NoopProvider {
    async fn describe(&self, _files: Vec<UploadFile>) -> Result<Vec<RemoteMetadata>, ProviderError> {
        Err(ProviderError::NotImplemented)
    }
}
