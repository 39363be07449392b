//! # Register Session
//!
//! Owns the [`Checkout`] for one terminal and runs operator commands
//! against it and the SQLite store.
//!
//! ## Completing a Sale
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Two-Phase Completion                                 │
//! │                                                                         │
//! │  > complete                                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  checkout.prepare_sale()  ← gate check, builds the SaleRecord          │
//! │       │                     (cart and tender untouched)                 │
//! │       ▼                                                                 │
//! │  db.sales().append(&record).await  ← one transaction, fsync'd          │
//! │       │                                                                 │
//! │       ├── Err ──► sale stays open, operator can retry                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  checkout.commit(pending)  ← receipt counter advances, fresh cart      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use std::fmt::Write as _;
use till_core::{
    Checkout, CheckoutState, CoreError, CurrencyFormat, DateRange, Money, Product, SaleRecord,
    SalesSummary,
};
use till_db::Database;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::command::{Command, DiscountTarget, ProductRef, HELP};
use crate::config::RegisterConfig;
use crate::error::{RegisterError, RegisterResult};

/// Rows shown by `search`.
pub const SEARCH_LIMIT: u32 = 20;

/// One terminal's checkout plus its store handle.
pub struct Session {
    db: Database,
    checkout: Checkout,
    currency: CurrencyFormat,
    top_products: usize,
    last_results: Vec<Product>,
}

impl Session {
    /// Builds the checkout and resumes today's receipt numbering from the
    /// ledger.
    pub async fn open(config: &RegisterConfig, db: Database) -> RegisterResult<Self> {
        let terminal = &config.checkout.terminal_id;
        let today = Utc::now().date_naive();
        let receipts = db.sales().receipt_sequence(terminal, today).await?;
        let checkout = Checkout::new(config.checkout.clone())?.with_receipt_sequence(receipts);

        info!(terminal = %terminal, cashier = %config.checkout.cashier_id, "Register session opened");

        Ok(Session {
            db,
            checkout,
            currency: config.checkout.currency_format(),
            top_products: config.store.report_top_products,
            last_results: Vec::new(),
        })
    }

    pub fn checkout(&self) -> &Checkout {
        &self.checkout
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Reads commands until EOF or `quit`, writing one reply per command.
    ///
    /// Command errors are printed with their code and do not stop the loop.
    /// With `echo`, each command is written back first (for script files).
    pub async fn run<R, W>(&mut self, input: R, mut output: W, echo: bool) -> RegisterResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            if echo && !line.trim().is_empty() {
                output.write_all(format!("> {}\n", line.trim()).as_bytes()).await?;
            }

            let reply = match Command::parse(&line) {
                Ok(None) => continue,
                Ok(Some(Command::Quit)) => break,
                Ok(Some(command)) => self.execute(command).await,
                Err(e) => Err(e),
            };

            let text = match reply {
                Ok(text) => text,
                Err(e) => {
                    debug!(code = %e.code(), error = %e, "Command failed");
                    format!("error [{}]: {}", e.code(), e)
                }
            };
            output.write_all(text.as_bytes()).await?;
            output.write_all(b"\n").await?;
            output.flush().await?;
        }

        if self.has_open_sale() {
            warn!("Session ended with an open sale, it was not recorded");
        }
        Ok(())
    }

    /// Runs one command and returns the text to show.
    pub async fn execute(&mut self, command: Command) -> RegisterResult<String> {
        match command {
            Command::Help => Ok(HELP.to_string()),
            Command::Search(query) => self.search(&query).await,
            Command::Add { product, quantity } => {
                let product = self.lookup(product).await?;
                self.checkout.add_item(&product, quantity)?;
                Ok(self.render_cart())
            }
            Command::Quantity { line, quantity } => {
                let id = self.line_id(line)?;
                self.checkout.set_quantity(&id, quantity)?;
                Ok(self.render_cart())
            }
            Command::Increment(line) => {
                let id = self.line_id(line)?;
                self.checkout.increment(&id)?;
                Ok(self.render_cart())
            }
            Command::Decrement(line) => {
                let id = self.line_id(line)?;
                self.checkout.decrement(&id)?;
                Ok(self.render_cart())
            }
            Command::Remove(line) => {
                let id = self.line_id(line)?;
                self.checkout.remove_item(&id);
                Ok(self.render_cart())
            }
            Command::Discount { target, discount } => {
                match target {
                    DiscountTarget::Cart => self.checkout.set_cart_discount(discount)?,
                    DiscountTarget::Line(line) => {
                        let id = self.line_id(line)?;
                        self.checkout.set_item_discount(&id, discount)?;
                    }
                }
                Ok(self.render_cart())
            }
            Command::ClearCart => {
                self.checkout.clear_cart();
                Ok(self.render_cart())
            }
            Command::Pay => match self.checkout.begin_payment() {
                CheckoutState::AwaitingPayment => Ok(self.render_balance()),
                _ => Ok("cart is empty".to_string()),
            },
            Command::Method(method) => {
                self.checkout.select_method(method)?;
                Ok(self.render_balance())
            }
            Command::Enter(typed) => match self.checkout.set_pending_entry(&typed)? {
                Some(amount) => Ok(format!("entered {} (not applied)", self.money(amount))),
                None => Ok("entry cleared".to_string()),
            },
            Command::Apply(amount) => {
                match amount {
                    Some(amount) => self.checkout.apply_cash(amount)?,
                    None => self.checkout.apply_pending()?,
                };
                Ok(self.render_balance())
            }
            Command::Quick(None) => Ok(self.render_quick_cash()),
            Command::Quick(Some(n)) => {
                let amount = n
                    .checked_sub(1)
                    .and_then(|i| self.checkout.quick_cash().get(i).copied())
                    .ok_or(RegisterError::Usage("quick [n], n from 1 to 9"))?;
                self.checkout.apply_cash(amount)?;
                Ok(self.render_balance())
            }
            Command::ClearCash => {
                self.checkout.clear_applied_cash();
                Ok(self.render_balance())
            }
            Command::Complete => self.complete().await,
            Command::Cancel => {
                let open = self.has_open_sale();
                self.checkout.cancel();
                Ok(if open { "sale cancelled" } else { "nothing to cancel" }.to_string())
            }
            Command::Show => Ok(self.render_cart()),
            Command::Sale(key) => {
                let record = self.find_sale(&key).await?;
                Ok(self.render_record(&record))
            }
            Command::Report(day) => {
                let day = day.unwrap_or_else(|| Utc::now().date_naive());
                let records = self.db.sales().query(&DateRange::day(day)).await?;
                let summary = SalesSummary::from_records(&records, self.top_products);
                Ok(self.render_summary(&day.to_string(), &summary))
            }
            Command::Quit => Ok(String::new()),
        }
    }

    // =========================================================================
    // Command Helpers
    // =========================================================================

    async fn search(&mut self, query: &str) -> RegisterResult<String> {
        self.last_results = self.db.products().search(query, SEARCH_LIMIT).await?;
        if self.last_results.is_empty() {
            return Ok("no products found".to_string());
        }

        let mut out = String::new();
        for (i, p) in self.last_results.iter().enumerate() {
            let _ = writeln!(out, "#{:<3} {:<12} {:<44} {:>10}", i + 1, p.sku, p.name, self.money(p.price));
        }
        out.pop();
        Ok(out)
    }

    async fn lookup(&self, product: ProductRef) -> RegisterResult<Product> {
        match product {
            ProductRef::SearchResult(n) => n
                .checked_sub(1)
                .and_then(|i| self.last_results.get(i).cloned())
                .ok_or_else(|| CoreError::ProductNotFound(format!("#{n}")).into()),
            ProductRef::Key(key) => match self.db.products().resolve(&key).await? {
                Some(product) => Ok(product),
                None => Err(CoreError::ProductNotFound(key).into()),
            },
        }
    }

    fn has_open_sale(&self) -> bool {
        self.checkout.state() != CheckoutState::Building
            || !self.checkout.cart().is_empty()
            || self.checkout.cart().cart_discount().is_some()
    }

    /// Cart line `line` (1-based) to its item id.
    fn line_id(&self, line: usize) -> RegisterResult<String> {
        line.checked_sub(1)
            .and_then(|i| self.checkout.cart().items().get(i))
            .map(|item| item.id().to_string())
            .ok_or(RegisterError::NoSuchLine(line))
    }

    async fn complete(&mut self) -> RegisterResult<String> {
        let pending = self.checkout.prepare_sale()?;

        if let Err(e) = self.db.sales().append(pending.record()).await {
            warn!(error = %e, id = %pending.record().id, "Sale append failed, sale kept open");
            return Err(CoreError::Store(e.into()).into());
        }

        let record = self.checkout.commit(pending)?;
        Ok(self.render_record(&record))
    }

    async fn find_sale(&self, key: &str) -> RegisterResult<SaleRecord> {
        let sales = self.db.sales();
        if let Some(record) = sales.get_by_receipt(key).await? {
            return Ok(record);
        }
        match sales.get_by_id(key).await? {
            Some(record) => Ok(record),
            None => Err(CoreError::SaleNotFound(key.to_string()).into()),
        }
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    fn money(&self, amount: Money) -> String {
        amount.format(&self.currency)
    }

    fn render_cart(&self) -> String {
        let cart = self.checkout.cart();
        if cart.is_empty() {
            let mut out = "cart is empty".to_string();
            if let Some(d) = cart.cart_discount() {
                let _ = write!(out, " (cart discount {d} kept)");
            }
            return out;
        }

        let mut out = String::new();
        for (i, item) in cart.items().iter().enumerate() {
            let _ = write!(
                out,
                "{:>3}. {:<12} {:<36} {:>3} x {:>9} = {:>10}",
                i + 1,
                item.sku(),
                item.name(),
                item.quantity(),
                self.money(item.unit_price()),
                self.money(item.net_total()),
            );
            if let Some(d) = item.discount() {
                let _ = write!(out, "  [{d}: -{}]", self.money(item.discount_amount()));
            }
            out.push('\n');
        }

        let t = self.checkout.totals();
        let _ = writeln!(out, "     subtotal {:>12}", self.money(t.subtotal));
        if let Some(d) = cart.cart_discount() {
            let _ = writeln!(out, "     discount {:>12}  [{d}]", format!("-{}", self.money(t.cart_discount)));
        }
        let _ = writeln!(out, "     tax {:>4} {:>12}", cart.tax_rate().to_string(), self.money(t.tax));
        let _ = write!(out, "     total    {:>12}", self.money(t.total));
        out
    }

    fn render_balance(&self) -> String {
        let tender = self.checkout.tender();
        let method = tender.method().map(|m| m.to_string()).unwrap_or_else(|| "none".to_string());

        let mut out = format!(
            "total {}  method {}  cash {}  remaining {}",
            self.money(self.checkout.totals().total),
            method,
            self.money(tender.cash_applied()),
            self.money(self.checkout.remaining_balance()),
        );
        let change = self.checkout.change_due();
        if change.is_positive() {
            let _ = write!(out, "  change {}", self.money(change));
        }
        if self.checkout.can_complete() {
            out.push_str("  (ready)");
        }
        out
    }

    fn render_quick_cash(&self) -> String {
        self.checkout
            .quick_cash()
            .iter()
            .enumerate()
            .map(|(i, amount)| format!("{}) {}", i + 1, self.money(*amount)))
            .collect::<Vec<_>>()
            .join("  ")
    }

    fn render_record(&self, record: &SaleRecord) -> String {
        let mut out = format!(
            "receipt {}  {}  cashier {}\n",
            record.receipt_number,
            record.created_at.format("%Y-%m-%d %H:%M:%S"),
            record.cashier_id,
        );
        for line in &record.lines {
            let _ = writeln!(
                out,
                "  {:<36} {:>3} x {:>9} = {:>10}",
                line.name,
                line.quantity,
                self.money(line.unit_price),
                self.money(line.line_total),
            );
        }
        let _ = writeln!(out, "  subtotal {}", self.money(record.subtotal));
        if record.discount.is_positive() {
            let _ = writeln!(out, "  discount -{}", self.money(record.discount));
        }
        let _ = writeln!(out, "  tax {} {}", record.tax_rate, self.money(record.tax));
        let _ = write!(
            out,
            "  total {}  paid by {}",
            self.money(record.total),
            record.payment_method
        );
        if record.cash_tendered.is_positive() {
            let _ = write!(
                out,
                "  tendered {}  change {}",
                self.money(record.cash_tendered),
                self.money(record.change_given)
            );
        }
        out
    }

    fn render_summary(&self, label: &str, s: &SalesSummary) -> String {
        let mut out = format!("report {label}: {} sales\n", s.sale_count);
        let _ = writeln!(out, "  gross     {:>12}", self.money(s.gross_sales));
        let _ = writeln!(out, "  net       {:>12}", self.money(s.net_sales));
        let _ = writeln!(out, "  tax       {:>12}", self.money(s.tax_collected));
        let _ = writeln!(
            out,
            "  discounts {:>12}  (lines {}, cart {})",
            self.money(s.line_discounts + s.cart_discounts),
            self.money(s.line_discounts),
            self.money(s.cart_discounts),
        );
        let _ = writeln!(out, "  cash      {:>12}  ({} sales)", self.money(s.cash_total), s.cash_count);
        let _ = writeln!(out, "  card      {:>12}  ({} sales)", self.money(s.card_total), s.card_count);
        let _ = writeln!(out, "  average   {:>12}", self.money(s.average_sale));
        let _ = write!(out, "  margin    {:>12}", self.money(s.gross_margin));
        for (i, top) in s.top_products.iter().enumerate() {
            let _ = write!(
                out,
                "\n  {}. {:<36} {:>4} sold {:>10}",
                i + 1,
                top.name,
                top.quantity_sold,
                self.money(top.revenue)
            );
        }
        out
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
