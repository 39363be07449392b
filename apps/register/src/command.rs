//! # Operator Commands
//!
//! One command per input line. Parsing is pure; nothing here touches the
//! checkout or the database.
//!
//! Line numbers are 1-based positions in the cart as shown by `cart`.
//! `#n` refers to the n-th result of the last `search`.

use chrono::NaiveDate;
use till_core::{Discount, Money, PaymentMethod};

use crate::error::{RegisterError, RegisterResult};

pub const HELP: &str = "\
commands:
  search [text]                      search active products (empty lists all)
  add <sku|barcode|id|#n> [qty]      add a product (#n = n-th search result)
  qty <line> <n>                     set a line's quantity
  inc <line> | dec <line>            step a line's quantity (never below 1)
  remove <line>                      remove a line
  discount <line|cart> <flat|percent> <value> [reason]
  discount <line|cart> none          clear a discount
  clear                              empty the cart
  pay                                start taking payment
  method <cash|card>                 select the payment method
  enter [amount]                     type a cash amount without applying it
  apply [amount]                     apply cash (typed amount if none given)
  quick [n]                          list quick-cash amounts, or apply the n-th
  clear-cash                         reset applied cash
  complete                           record the sale
  cancel                             abandon the sale
  cart | totals                      show the cart and balance
  sale <receipt|id>                  show a recorded sale
  report [YYYY-MM-DD]                sales summary for a day (default today)
  help                               this text
  quit | exit                        leave the register";

const USAGE_ADD: &str = "add <sku|barcode|id|#n> [qty]";
const USAGE_QTY: &str = "qty <line> <n>";
const USAGE_INC: &str = "inc <line>";
const USAGE_DEC: &str = "dec <line>";
const USAGE_REMOVE: &str = "remove <line>";
const USAGE_DISCOUNT: &str = "discount <line|cart> <flat|percent> <value> [reason] | discount <line|cart> none";
const USAGE_METHOD: &str = "method <cash|card>";
const USAGE_QUICK: &str = "quick [n]";
const USAGE_SALE: &str = "sale <receipt|id>";
const USAGE_REPORT: &str = "report [YYYY-MM-DD]";

/// How `add` names a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductRef {
    /// 1-based index into the last search results.
    SearchResult(usize),
    /// Id, SKU or barcode.
    Key(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscountTarget {
    Cart,
    Line(usize),
}

/// A parsed operator command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Search(String),
    Add { product: ProductRef, quantity: i64 },
    Quantity { line: usize, quantity: i64 },
    Increment(usize),
    Decrement(usize),
    Remove(usize),
    Discount { target: DiscountTarget, discount: Option<Discount> },
    ClearCart,
    Pay,
    Method(PaymentMethod),
    Enter(String),
    /// `None` applies the typed amount.
    Apply(Option<Money>),
    /// `None` lists suggestions; `Some(n)` applies the n-th.
    Quick(Option<usize>),
    ClearCash,
    Complete,
    Cancel,
    Show,
    Sale(String),
    /// `None` means today.
    Report(Option<NaiveDate>),
    Quit,
}

impl Command {
    /// Parses one input line. Blank lines and `#` comments yield `None`.
    pub fn parse(line: &str) -> RegisterResult<Option<Command>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let args: Vec<&str> = rest.split_whitespace().collect();

        let command = match word.to_lowercase().as_str() {
            "help" | "?" => Command::Help,
            "search" | "find" => Command::Search(rest.to_string()),
            "add" => {
                let key = args.first().ok_or(RegisterError::Usage(USAGE_ADD))?;
                let quantity = match args.get(1) {
                    Some(q) => parse_quantity(q, USAGE_ADD)?,
                    None => 1,
                };
                let product = match key.strip_prefix('#') {
                    Some(n) => ProductRef::SearchResult(parse_index(Some(&n), USAGE_ADD)?),
                    None => ProductRef::Key((*key).to_string()),
                };
                Command::Add { product, quantity }
            }
            "qty" | "quantity" => {
                let line = parse_index(args.first(), USAGE_QTY)?;
                let quantity = parse_quantity(args.get(1).ok_or(RegisterError::Usage(USAGE_QTY))?, USAGE_QTY)?;
                Command::Quantity { line, quantity }
            }
            "inc" | "+" => Command::Increment(parse_index(args.first(), USAGE_INC)?),
            "dec" | "-" => Command::Decrement(parse_index(args.first(), USAGE_DEC)?),
            "remove" | "rm" => Command::Remove(parse_index(args.first(), USAGE_REMOVE)?),
            "discount" => parse_discount(&args)?,
            "clear" => Command::ClearCart,
            "pay" => Command::Pay,
            "method" => {
                let method = args.first().ok_or(RegisterError::Usage(USAGE_METHOD))?;
                Command::Method(method.parse::<PaymentMethod>()?)
            }
            "enter" => Command::Enter(rest.to_string()),
            "apply" => match args.first() {
                Some(amount) => Command::Apply(Some(Money::from_decimal_str(amount)?)),
                None => Command::Apply(None),
            },
            "quick" => match args.first() {
                Some(_) => Command::Quick(Some(parse_index(args.first(), USAGE_QUICK)?)),
                None => Command::Quick(None),
            },
            "clear-cash" => Command::ClearCash,
            "complete" | "done" => Command::Complete,
            "cancel" | "void" => Command::Cancel,
            "cart" | "totals" => Command::Show,
            "sale" => {
                let key = args.first().ok_or(RegisterError::Usage(USAGE_SALE))?;
                Command::Sale((*key).to_string())
            }
            "report" => match args.first() {
                Some(day) => Command::Report(Some(
                    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|_| RegisterError::Usage(USAGE_REPORT))?,
                )),
                None => Command::Report(None),
            },
            "quit" | "exit" => Command::Quit,
            other => return Err(RegisterError::UnknownCommand(other.to_string())),
        };

        Ok(Some(command))
    }
}

fn parse_discount(args: &[&str]) -> RegisterResult<Command> {
    let target = match args.first() {
        Some(t) if t.eq_ignore_ascii_case("cart") => DiscountTarget::Cart,
        Some(_) => DiscountTarget::Line(parse_index(args.first(), USAGE_DISCOUNT)?),
        None => return Err(RegisterError::Usage(USAGE_DISCOUNT)),
    };

    let kind = args.get(1).ok_or(RegisterError::Usage(USAGE_DISCOUNT))?;
    if kind.eq_ignore_ascii_case("none") {
        return Ok(Command::Discount { target, discount: None });
    }

    let value = args.get(2).ok_or(RegisterError::Usage(USAGE_DISCOUNT))?;
    let mut discount = Discount::parse(kind, value)?;
    if args.len() > 3 {
        discount = discount.with_reason(args[3..].join(" "));
    }

    Ok(Command::Discount {
        target,
        discount: Some(discount),
    })
}

/// A positive 1-based index.
fn parse_index(arg: Option<&&str>, usage: &'static str) -> RegisterResult<usize> {
    match arg.and_then(|a| a.parse::<usize>().ok()) {
        Some(n) if n >= 1 => Ok(n),
        _ => Err(RegisterError::Usage(usage)),
    }
}

/// Any integer; the cart decides whether it is allowed.
fn parse_quantity(arg: &str, usage: &'static str) -> RegisterResult<i64> {
    arg.parse::<i64>().map_err(|_| RegisterError::Usage(usage))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Command {
        Command::parse(line).unwrap().unwrap()
    }

    #[test]
    fn test_blank_and_comment_lines() {
        assert_eq!(Command::parse("").unwrap(), None);
        assert_eq!(Command::parse("   ").unwrap(), None);
        assert_eq!(Command::parse("# opening float").unwrap(), None);
    }

    #[test]
    fn test_add_forms() {
        assert_eq!(
            parse("add JACDA001 2"),
            Command::Add {
                product: ProductRef::Key("JACDA001".into()),
                quantity: 2
            }
        );
        assert_eq!(
            parse("ADD #3"),
            Command::Add {
                product: ProductRef::SearchResult(3),
                quantity: 1
            }
        );
        assert!(matches!(Command::parse("add"), Err(RegisterError::Usage(_))));
        assert!(matches!(Command::parse("add #0"), Err(RegisterError::Usage(_))));
        assert!(matches!(Command::parse("add X two"), Err(RegisterError::Usage(_))));
    }

    #[test]
    fn test_quantity_passes_zero_through() {
        assert_eq!(parse("qty 1 0"), Command::Quantity { line: 1, quantity: 0 });
        assert!(matches!(Command::parse("qty 0 2"), Err(RegisterError::Usage(_))));
    }

    #[test]
    fn test_discount_forms() {
        let cmd = parse("discount cart percent 10 loyalty card");
        match cmd {
            Command::Discount {
                target: DiscountTarget::Cart,
                discount: Some(d),
            } => {
                assert_eq!(d.resolve(Money::from_cents(4998)), Money::from_cents(500));
                assert_eq!(d.reason(), Some("loyalty card"));
            }
            other => panic!("unexpected {other:?}"),
        }

        assert_eq!(
            parse("discount 2 none"),
            Command::Discount {
                target: DiscountTarget::Line(2),
                discount: None
            }
        );
        assert!(Command::parse("discount cart percent 150").is_err());
        assert!(matches!(Command::parse("discount cart flat"), Err(RegisterError::Usage(_))));
    }

    #[test]
    fn test_payment_commands() {
        assert_eq!(parse("method card"), Command::Method(PaymentMethod::Card));
        assert_eq!(parse("apply 20.00"), Command::Apply(Some(Money::from_cents(2000))));
        assert_eq!(parse("apply"), Command::Apply(None));
        assert_eq!(parse("enter 40"), Command::Enter("40".into()));
        assert_eq!(parse("enter"), Command::Enter(String::new()));
        assert_eq!(parse("quick"), Command::Quick(None));
        assert_eq!(parse("quick 2"), Command::Quick(Some(2)));
        assert!(Command::parse("method cheque").is_err());
        assert!(Command::parse("apply lots").is_err());
    }

    #[test]
    fn test_report_date() {
        assert_eq!(
            parse("report 2026-01-31"),
            Command::Report(NaiveDate::from_ymd_opt(2026, 1, 31))
        );
        assert_eq!(parse("report"), Command::Report(None));
        assert!(matches!(Command::parse("report yesterday"), Err(RegisterError::Usage(_))));
    }

    #[test]
    fn test_unknown_command() {
        assert!(matches!(
            Command::parse("frobnicate now"),
            Err(RegisterError::UnknownCommand(w)) if w == "frobnicate"
        ));
    }

    #[test]
    fn test_search_keeps_whole_query() {
        assert_eq!(parse("search grey goose"), Command::Search("grey goose".into()));
        assert_eq!(parse("search"), Command::Search(String::new()));
    }
}
