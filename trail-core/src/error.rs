//! # Erros do Pipeline
//!
//! Três famílias de falha, com tratamentos diferentes:
//!
//! - **Qualidade de dados** ([`TrailError::DataQuality`]): afeta uma única parada
//!   (ex: grupo sem espécie nem nome comum). É registrada e a parada é descartada.
//! - **Estrutura** ([`TrailError::Structural`]): o documento não tem a forma
//!   esperada (ex: nenhuma seção "TOUR"). Aborta a execução, pois todos os
//!   offsets seguintes perdem o sentido.
//! - **Busca sem resultado**: não é erro. Um id desconhecido vira `None`.

use thiserror::Error;

/// Resultado padrão das operações do crate.
pub type Result<T> = std::result::Result<T, TrailError>;

#[derive(Error, Debug)]
pub enum TrailError {
    /// Falha de leitura ou escrita.
    #[error("erro de E/S: {0}")]
    Io(#[from] std::io::Error),

    /// JSON de entrada malformado.
    #[error("erro de JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Falha ao escrever uma tabela CSV.
    #[error("erro de CSV: {0}")]
    Csv(#[from] csv::Error),

    /// O documento não segue o layout de seções esperado.
    #[error("estrutura do documento inválida: {0}")]
    Structural(String),

    /// Um registro individual não pôde ser construído.
    #[error("dado inválido: {0}")]
    DataQuality(String),

    /// Configuração inconsistente.
    #[error("configuração inválida: {0}")]
    Config(String),
}

impl TrailError {
    pub fn structural(msg: impl Into<String>) -> Self {
        TrailError::Structural(msg.into())
    }

    pub fn data_quality(msg: impl Into<String>) -> Self {
        TrailError::DataQuality(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        TrailError::Config(msg.into())
    }

    /// Indica se o erro deve interromper a execução inteira.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, TrailError::DataQuality(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_quality_is_not_fatal() {
        assert!(!TrailError::data_quality("sem título").is_fatal());
        assert!(TrailError::structural("sem TOUR").is_fatal());
    }

    #[test]
    fn test_error_messages() {
        let err = TrailError::structural("nenhuma seção de tour");
        assert_eq!(err.to_string(), "estrutura do documento inválida: nenhuma seção de tour");
    }
}
