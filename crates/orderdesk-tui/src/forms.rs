//! Parsers for the one-line modal prompts.
//!
//! Every mutation in the shell is entered as a single line of text. Parsers
//! return a user-facing message on bad input so the prompt can stay open.

use orderdesk_core::models::{
    CustomerCreate, MovementType, OrderCreate, OrderItemCreate, PaymentCreate, PaymentType,
    ProductCreate, StockMovementCreate, UserCreate,
};

/// Separator for multi-field text prompts
const FIELD_SEPARATOR: char = ';';

pub type ParseResult<T> = Result<T, String>;

/// Non-empty trimmed text, for notes, reasons, statuses and names
pub fn parse_text(input: &str, what: &str) -> ParseResult<String> {
    let text = input.trim();
    if text.is_empty() {
        return Err(format!("{} cannot be empty", what));
    }
    Ok(text.to_string())
}

/// `amount [cash|transfer]`, defaulting to cash
pub fn parse_payment(input: &str) -> ParseResult<PaymentCreate> {
    let mut parts = input.split_whitespace();
    let amount = parts
        .next()
        .ok_or_else(|| "Enter an amount, e.g. 25.00 cash".to_string())?;
    let amount = parse_amount(amount)?;
    if amount <= 0.0 {
        return Err("Amount must be greater than zero".to_string());
    }

    let payment_type = match parts.next() {
        Some(kind) => kind.parse::<PaymentType>()?,
        None => PaymentType::Cash,
    };
    if parts.next().is_some() {
        return Err("Expected: amount [cash|transfer]".to_string());
    }

    Ok(PaymentCreate { amount, payment_type })
}

/// `customer_id product_id:quantity:unit_price ...`
pub fn parse_order(input: &str) -> ParseResult<OrderCreate> {
    let mut parts = input.split_whitespace();
    let customer_id = parts
        .next()
        .ok_or_else(|| "Expected: customer_id product:qty:price ...".to_string())?;
    let customer_id = parse_id(customer_id, "customer id")?;

    let items = parts.map(parse_order_item).collect::<ParseResult<Vec<_>>>()?;
    if items.is_empty() {
        return Err("An order needs at least one item (product:qty:price)".to_string());
    }

    Ok(OrderCreate { customer_id, items })
}

fn parse_order_item(token: &str) -> ParseResult<OrderItemCreate> {
    let fields: Vec<&str> = token.split(':').collect();
    let [product, quantity, price] = fields.as_slice() else {
        return Err(format!("'{}' is not product:qty:price", token));
    };

    let product_id = parse_id(product, "product id")?;
    let quantity: i64 = quantity
        .parse()
        .map_err(|_| format!("'{}' is not a quantity", quantity))?;
    if quantity <= 0 {
        return Err("Quantities must be positive".to_string());
    }
    let unit_price = parse_amount(price)?;
    if unit_price < 0.0 {
        return Err("Prices cannot be negative".to_string());
    }

    Ok(OrderItemCreate { product_id, quantity, unit_price })
}

/// `name; phone[; additional phones]`
pub fn parse_customer(input: &str) -> ParseResult<CustomerCreate> {
    let fields = split_fields(input);
    match fields.as_slice() {
        [name, phone] | [name, phone, ""] => Ok(CustomerCreate {
            name: parse_text(name, "Name")?,
            primary_phone: parse_text(phone, "Phone")?,
            additional_phones: None,
        }),
        [name, phone, extra] => Ok(CustomerCreate {
            name: parse_text(name, "Name")?,
            primary_phone: parse_text(phone, "Phone")?,
            additional_phones: Some(extra.to_string()),
        }),
        _ => Err("Expected: name; phone[; other phones]".to_string()),
    }
}

/// `name; category[; cost notes]`
pub fn parse_product(input: &str) -> ParseResult<ProductCreate> {
    let fields = split_fields(input);
    let (name, category, cost) = match fields.as_slice() {
        [name, category] => (name, category, None),
        [name, category, cost] => (name, category, Some(cost).filter(|c| !c.is_empty())),
        _ => return Err("Expected: name; category[; cost notes]".to_string()),
    };

    Ok(ProductCreate {
        name: parse_text(name, "Name")?,
        category: parse_text(category, "Category")?,
        is_active: Some(true),
        cost_metadata: cost.map(|c| c.to_string()),
    })
}

/// `product_id type quantity [total_cost][; description]`
pub fn parse_stock_movement(input: &str) -> ParseResult<StockMovementCreate> {
    let (head, description) = match input.split_once(FIELD_SEPARATOR) {
        Some((head, rest)) => (head, Some(rest.trim()).filter(|d| !d.is_empty())),
        None => (input, None),
    };

    let tokens: Vec<&str> = head.split_whitespace().collect();
    let (product, kind, quantity, cost) = match tokens.as_slice() {
        [product, kind, quantity] => (product, kind, quantity, None),
        [product, kind, quantity, cost] => (product, kind, quantity, Some(cost)),
        _ => return Err("Expected: product_id type quantity [total_cost][; description]".to_string()),
    };

    let quantity: i64 = quantity
        .parse()
        .map_err(|_| format!("'{}' is not a quantity", quantity))?;
    if quantity == 0 {
        return Err("Quantity cannot be zero".to_string());
    }

    Ok(StockMovementCreate {
        product_id: parse_id(product, "product id")?,
        movement_type: kind.parse::<MovementType>()?,
        quantity,
        total_cost: cost.map(|c| parse_amount(c)).transpose()?,
        order_id: None,
        customer_id: None,
        description: description.map(|d| d.to_string()),
    })
}

/// `username; full name; password`
pub fn parse_user(input: &str) -> ParseResult<UserCreate> {
    let fields = split_fields(input);
    let [username, full_name, password] = fields.as_slice() else {
        return Err("Expected: username; full name; password".to_string());
    };

    let username = parse_text(username, "Username")?;
    if username.contains(char::is_whitespace) {
        return Err("Usernames cannot contain spaces".to_string());
    }

    Ok(UserCreate {
        username,
        full_name: parse_text(full_name, "Full name")?,
        password: parse_text(password, "Password")?,
    })
}

fn split_fields(input: &str) -> Vec<&str> {
    input.split(FIELD_SEPARATOR).map(str::trim).collect()
}

fn parse_id(s: &str, what: &str) -> ParseResult<i64> {
    s.trim()
        .trim_start_matches('#')
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| format!("'{}' is not a valid {}", s, what))
}

fn parse_amount(s: &str) -> ParseResult<f64> {
    s.trim()
        .trim_start_matches('$')
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("'{}' is not an amount", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_payment() {
        let payment = parse_payment("25.50 transfer").unwrap();
        assert_eq!(payment.amount, 25.5);
        assert_eq!(payment.payment_type, PaymentType::Transfer);

        let payment = parse_payment("$10").unwrap();
        assert_eq!(payment.payment_type, PaymentType::Cash);

        assert!(parse_payment("").is_err());
        assert!(parse_payment("0 cash").is_err());
        assert!(parse_payment("ten cash").is_err());
        assert!(parse_payment("10 cheque").is_err());
        assert!(parse_payment("10 cash extra").is_err());
    }

    #[test]
    fn test_parse_order() {
        let order = parse_order("7 4:2:3.50 9:1:12").unwrap();
        assert_eq!(order.customer_id, 7);
        assert_eq!(
            order.items,
            vec![
                OrderItemCreate { product_id: 4, quantity: 2, unit_price: 3.5 },
                OrderItemCreate { product_id: 9, quantity: 1, unit_price: 12.0 },
            ]
        );
    }

    #[test]
    fn test_parse_order_rejects_bad_items() {
        assert!(parse_order("7").is_err());
        assert!(parse_order("abc 4:2:3").is_err());
        assert!(parse_order("7 4:2").is_err());
        assert!(parse_order("7 4:0:3").is_err());
        assert!(parse_order("7 4:2:-1").is_err());
    }

    #[test]
    fn test_parse_customer() {
        let customer = parse_customer("Corner Bakery; 555-0101").unwrap();
        assert_eq!(customer.name, "Corner Bakery");
        assert_eq!(customer.primary_phone, "555-0101");
        assert!(customer.additional_phones.is_none());

        let customer = parse_customer("Corner Bakery; 555-0101; 555-0102").unwrap();
        assert_eq!(customer.additional_phones.as_deref(), Some("555-0102"));

        assert!(parse_customer("Corner Bakery").is_err());
        assert!(parse_customer(" ; 555-0101").is_err());
    }

    #[test]
    fn test_parse_product() {
        let product = parse_product("Rye loaf; bread; 1.20 per unit").unwrap();
        assert_eq!(product.name, "Rye loaf");
        assert_eq!(product.category, "bread");
        assert_eq!(product.cost_metadata.as_deref(), Some("1.20 per unit"));
        assert_eq!(product.is_active, Some(true));

        assert!(parse_product("Rye loaf; ").is_err());
    }

    #[test]
    fn test_parse_stock_movement() {
        let movement = parse_stock_movement("4 purchase 20 35.50; flour restock").unwrap();
        assert_eq!(movement.product_id, 4);
        assert_eq!(movement.movement_type, MovementType::Purchase);
        assert_eq!(movement.quantity, 20);
        assert_eq!(movement.total_cost, Some(35.5));
        assert_eq!(movement.description.as_deref(), Some("flour restock"));

        let movement = parse_stock_movement("4 adjustment -3").unwrap();
        assert_eq!(movement.movement_type, MovementType::ManualAdjustment);
        assert_eq!(movement.quantity, -3);
        assert!(movement.total_cost.is_none());
        assert!(movement.description.is_none());

        assert!(parse_stock_movement("4 theft 3").is_err());
        assert!(parse_stock_movement("4 waste 0").is_err());
        assert!(parse_stock_movement("4 waste").is_err());
    }

    #[test]
    fn test_parse_user() {
        let user = parse_user("jdoe; Jane Doe; s3cret").unwrap();
        assert_eq!(user.username, "jdoe");
        assert_eq!(user.full_name, "Jane Doe");
        assert_eq!(user.password, "s3cret");

        assert!(parse_user("j doe; Jane Doe; s3cret").is_err());
        assert!(parse_user("jdoe; Jane Doe").is_err());
    }

    #[test]
    fn test_parse_text() {
        assert_eq!(parse_text("  regular  ", "Status").unwrap(), "regular");
        assert_eq!(parse_text("   ", "Note").unwrap_err(), "Note cannot be empty");
    }
}
