//! 終端機決策來源（互動式決勝）

use std::io::{BufRead, Write};

use pab_calc::DecisionSource;
use pab_core::{Requirement, SaleOption};

/// 由終端機讀取選擇
pub struct ConsoleDecisionSource<R, W> {
    input: R,
    output: W,
}

impl ConsoleDecisionSource<std::io::StdinLock<'static>, std::io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsoleDecisionSource<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn present(&mut self, requirement: &Requirement, options: &[SaleOption]) -> std::io::Result<()> {
        writeln!(
            self.output,
            "\n{} × {} 有 {} 個同價方案：",
            requirement.key(),
            requirement.quantity,
            options.len()
        )?;
        for (i, option) in options.iter().enumerate() {
            writeln!(
                self.output,
                "  {}) 元件 {:<10} 單價 {:>6} 分  主要通道: {:<5}  單筆上限 {}",
                i + 1,
                option.element_id,
                option.price,
                if option.is_primary_channel() { "是" } else { "否" },
                option
                    .max_order_quantity
                    .map_or_else(|| "不限".to_string(), |max| max.to_string())
            )?;
        }
        write!(self.output, "請選擇 (1-{}): ", options.len())?;
        self.output.flush()
    }
}

impl<R: BufRead, W: Write> DecisionSource for ConsoleDecisionSource<R, W> {
    fn choose(&mut self, requirement: &Requirement, options: &[SaleOption]) -> Option<String> {
        if let Err(e) = self.present(requirement, options) {
            tracing::error!("無法輸出選項: {}", e);
            return None;
        }

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line),
            Err(e) => {
                tracing::error!("無法讀取輸入: {}", e);
                None
            }
        }
    }

    fn reject(&mut self, input: &str, reason: &str) {
        let _ = writeln!(self.output, "無效的選擇 {:?}: {}", input.trim(), reason);
    }
}
