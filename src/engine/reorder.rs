// ==========================================
// 需求预测补货系统 - 补货草稿单事务
// ==========================================
// 流程: 校验输入 → 生成单号 → 单事务写入(单头 + 明细)
// 红线:
// - 输入无效时不产生任何写入
// - 单头与明细同生同灭
// - 单号冲突按上限重试，超限后报错
// ==========================================

use crate::domain::reorder::{ReorderDraft, ReorderReceipt, REORDER_NOTES};
use crate::domain::types::offset_date;
use crate::engine::error::ReorderError;
use crate::repository::MovementRepository;
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// 单号后缀生成器（返回不含前缀的部分）
pub type ReferenceSuffixFn = Arc<dyn Fn() -> String + Send + Sync>;

/// 单号随机后缀长度
pub const REFERENCE_SUFFIX_LEN: usize = 8;

// ==========================================
// ReorderSettings - 补货单参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReorderSettings {
    pub lead_days: i64,
    pub vendor_placeholder: String,
    pub reference_prefix: String,
    pub max_attempts: u32,
    pub dest_location_id: i64,
}

impl Default for ReorderSettings {
    fn default() -> Self {
        Self {
            lead_days: 3,
            vendor_placeholder: "Pending Vendor".to_string(),
            reference_prefix: "PO-AUTO-".to_string(),
            max_attempts: 3,
            dest_location_id: 1,
        }
    }
}

/// 默认后缀: UUID v4 十六进制前 8 位，大写
pub fn random_reference_suffix() -> String {
    let mut hex = Uuid::new_v4().simple().to_string();
    hex.truncate(REFERENCE_SUFFIX_LEN);
    hex.to_uppercase()
}

// ==========================================
// ReorderTransaction - 补货草稿单创建
// ==========================================
pub struct ReorderTransaction {
    movement_repo: Arc<MovementRepository>,
    settings: ReorderSettings,
    suffix_fn: ReferenceSuffixFn,
}

impl ReorderTransaction {
    pub fn new(movement_repo: Arc<MovementRepository>, settings: ReorderSettings) -> Self {
        Self {
            movement_repo,
            settings,
            suffix_fn: Arc::new(random_reference_suffix),
        }
    }

    /// 替换单号后缀生成器
    pub fn with_suffix_fn(mut self, suffix_fn: ReferenceSuffixFn) -> Self {
        self.suffix_fn = suffix_fn;
        self
    }

    pub fn settings(&self) -> &ReorderSettings {
        &self.settings
    }

    /// 创建补货草稿单（以本地时间为创建时间）
    pub fn create(
        &self,
        product_id: Option<i64>,
        quantity: Option<f64>,
        vendor: Option<String>,
    ) -> Result<ReorderReceipt, ReorderError> {
        self.create_at(product_id, quantity, vendor, Local::now().naive_local())
    }

    /// 创建补货草稿单
    ///
    /// # 参数
    /// - `product_id` / `quantity`: 必填，product_id 须为正，quantity 须为正的有限数
    /// - `vendor`: 为空时使用占位供应商
    /// - `now`: 创建时间，计划日期 = now 日期 + lead_days
    ///
    /// # 返回
    /// - Ok(receipt): 单号与单头ID
    /// - Err(InvalidInput): 未写入任何数据
    /// - Err(Transaction / ReferenceExhausted): 事务已回滚
    #[instrument(skip(self, vendor))]
    pub fn create_at(
        &self,
        product_id: Option<i64>,
        quantity: Option<f64>,
        vendor: Option<String>,
        now: NaiveDateTime,
    ) -> Result<ReorderReceipt, ReorderError> {
        let product_id = product_id
            .ok_or_else(|| ReorderError::InvalidInput("缺少 product_id".to_string()))?;
        if product_id <= 0 {
            return Err(ReorderError::InvalidInput(format!(
                "product_id 必须为正数, 实际 {}",
                product_id
            )));
        }
        let quantity =
            quantity.ok_or_else(|| ReorderError::InvalidInput("缺少 quantity".to_string()))?;
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(ReorderError::InvalidInput(format!(
                "quantity 必须为正数, 实际 {}",
                quantity
            )));
        }

        let scheduled_date = offset_date(now.date(), self.settings.lead_days).ok_or_else(|| {
            ReorderError::InvalidInput(format!("提前期超出日期范围: {} 天", self.settings.lead_days))
        })?;

        let vendor = vendor
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| self.settings.vendor_placeholder.clone());

        let max_attempts = self.settings.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            let draft = ReorderDraft {
                reference: format!("{}{}", self.settings.reference_prefix, (self.suffix_fn)()),
                vendor: vendor.clone(),
                product_id,
                quantity,
                scheduled_date,
                dest_location_id: self.settings.dest_location_id,
                notes: REORDER_NOTES.to_string(),
                created_at: now,
            };

            match self.movement_repo.insert_reorder_draft(&draft) {
                Ok(order_id) => {
                    info!(reference = %draft.reference, order_id, "补货草稿单已创建");
                    return Ok(ReorderReceipt {
                        reference: draft.reference,
                        order_id,
                    });
                }
                Err(e) if e.is_unique_violation() => {
                    warn!(reference = %draft.reference, attempt, "补货单号冲突，重新生成");
                }
                Err(e) => {
                    error!(error = %e, "补货草稿单写入失败");
                    return Err(ReorderError::Transaction(e));
                }
            }
        }

        error!(attempts = max_attempts, "补货单号重试次数耗尽");
        Err(ReorderError::ReferenceExhausted {
            attempts: max_attempts,
        })
    }
}
