// 並行処理プリミティブ用のカスタムエラー型定義

use thiserror::Error;

/// 並行処理固有のエラー型
#[derive(Error, Debug)]
pub enum ConcurrencyError {
    /// クローズ済みチャンネルへの送信（利用側のバグ）
    #[error("クローズ済みチャンネルへの送信: 値は破棄されずに拒否されました")]
    SendOnClosed,

    /// 二重クローズ（利用側のバグ）
    #[error("チャンネルは既にクローズされています")]
    AlreadyClosed,

    #[error("キャンセルされました: {operation}")]
    Cancelled { operation: String },

    #[error("ワーカー失敗: {failed}/{total} 件 ({details})")]
    WorkerFailures {
        failed: usize,
        total: usize,
        details: String,
    },

    #[error("設定エラー: {message}")]
    Configuration { message: String },

    #[error("タスクエラー: {source}")]
    Task {
        #[source]
        source: tokio::task::JoinError,
    },
}

impl ConcurrencyError {
    /// キャンセルエラーの作成
    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::Cancelled {
            operation: operation.into(),
        }
    }

    /// 集約されたワーカー失敗の作成
    pub fn worker_failures(failed: usize, total: usize, details: impl Into<String>) -> Self {
        Self::WorkerFailures {
            failed,
            total,
            details: details.into(),
        }
    }

    /// 設定エラーの作成
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// タスクエラーの作成
    pub fn task(source: tokio::task::JoinError) -> Self {
        Self::Task { source }
    }

    /// エラーの重要度を取得
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::SendOnClosed | Self::AlreadyClosed => ErrorSeverity::Critical,
            Self::Configuration { .. } => ErrorSeverity::High,
            Self::WorkerFailures { .. } | Self::Task { .. } => ErrorSeverity::Medium,
            Self::Cancelled { .. } => ErrorSeverity::Low,
        }
    }

    /// エラーが回復可能かどうかを判定
    ///
    /// 利用側のバグ（送信・クローズの誤用）は回復対象外。テストで検出すべき欠陥として扱う。
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::SendOnClosed | Self::AlreadyClosed => false,
            Self::Configuration { .. } => false,
            Self::Cancelled { .. } => true,
            Self::WorkerFailures { .. } => true,
            Self::Task { .. } => true,
        }
    }

    /// 利用側のバグに分類されるエラーか
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Self::SendOnClosed | Self::AlreadyClosed)
    }
}

/// エラーの重要度レベル
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// 低重要度 - ログ出力程度
    Low,
    /// 中重要度 - 警告レベル
    Medium,
    /// 高重要度 - 要対応
    High,
    /// 致命的 - 利用側のバグ
    Critical,
}

impl ErrorSeverity {
    /// 重要度の文字列表現を取得
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

/// 並行処理の結果型
pub type ConcurrencyResult<T> = std::result::Result<T, ConcurrencyError>;

impl From<tokio::task::JoinError> for ConcurrencyError {
    fn from(error: tokio::task::JoinError) -> Self {
        Self::task(error)
    }
}
