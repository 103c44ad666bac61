// src/common/documents.rs

use async_trait::async_trait;
use std::path::PathBuf;

use crate::common::error::AppError;

// O upload em si (multipart, object storage) é responsabilidade de um
// colaborador externo; o core só precisa conseguir REMOVER artefatos
// quando um super-admin apaga uma ordem.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn remove(&self, chave: &str) -> Result<(), AppError>;
}

// Implementação em disco local: as chaves são caminhos relativos ao
// diretório configurado em DOCUMENTOS_DIR.
pub struct LocalDocumentStore {
    base_dir: PathBuf,
}

impl LocalDocumentStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into() }
    }
}

#[async_trait]
impl DocumentStore for LocalDocumentStore {
    async fn remove(&self, chave: &str) -> Result<(), AppError> {
        let caminho = self.base_dir.join(chave);
        match tokio::fs::remove_file(&caminho).await {
            Ok(()) => Ok(()),
            // Artefato já ausente não é erro: a remoção é idempotente.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::InternalServerError(anyhow::anyhow!(
                "Falha ao remover documento {}: {}",
                caminho.display(),
                e
            ))),
        }
    }
}
