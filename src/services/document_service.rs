// src/services/document_service.rs

use genpdf::{elements, style, Element};
use image::Luma;
use qrcode::QrCode;

use crate::{
    common::error::AppError,
    models::order::{Order, PaymentMethod, PaymentStatus},
};

#[derive(Clone)]
pub struct DocumentService {
    fonts_dir: String,
    public_url: String,
}

fn pdf_error(e: impl std::fmt::Display) -> AppError {
    AppError::InternalServerError(anyhow::Error::msg(e.to_string()))
}

impl DocumentService {
    pub fn new(fonts_dir: String, public_url: String) -> Self {
        Self { fonts_dir, public_url }
    }

    /// Página do pedido no site (destino do QR code da nota).
    pub fn order_url(&self, order: &Order) -> String {
        format!("{}/orders/{}", self.public_url.trim_end_matches('/'), order.id)
    }

    pub fn generate_invoice_pdf(&self, order: &Order, currency: &str) -> Result<Vec<u8>, AppError> {
        // Carrega a fonte da pasta configurada
        let font_family = genpdf::fonts::from_files(&self.fonts_dir, "Roboto", None)
            .map_err(|_| AppError::FontNotFound(format!("Fonte Roboto não encontrada em {}", self.fonts_dir)))?;

        let currency = currency.to_uppercase();
        let money = |value: rust_decimal::Decimal| format!("{currency} {value:.2}");

        let mut doc = genpdf::Document::new(font_family);
        doc.set_title(format!("Order #{}", order.display_id));
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);

        // --- CABEÇALHO ---
        doc.push(elements::Paragraph::new(format!("INVOICE / ORDER #{}", order.display_id))
            .styled(style::Style::new().bold().with_font_size(16)));
        doc.push(elements::Paragraph::new(format!("Date: {}", order.created_at.format("%Y-%m-%d"))));
        doc.push(elements::Paragraph::new(format!("Status: {}", order.status.as_str())));

        let payment = match (order.payment_method, order.payment_status) {
            (PaymentMethod::Card, PaymentStatus::Paid) => "Card (paid)",
            (PaymentMethod::Card, PaymentStatus::Pending) => "Card (pending)",
            (PaymentMethod::CashOnDelivery, PaymentStatus::Paid) => "Cash on delivery (paid)",
            (PaymentMethod::CashOnDelivery, PaymentStatus::Pending) => "Cash on delivery",
        };
        doc.push(elements::Paragraph::new(format!("Payment: {payment}")));

        doc.push(elements::Break::new(1));

        // --- ENTREGA ---
        let shipping = &order.shipping.0;
        doc.push(elements::Paragraph::new("Ship to").styled(style::Style::new().bold()));
        doc.push(elements::Paragraph::new(shipping.full_name.clone()));
        doc.push(elements::Paragraph::new(shipping.address.clone()));
        doc.push(elements::Paragraph::new(format!("{} {}, {}", shipping.postal_code, shipping.city, shipping.country)));
        doc.push(elements::Paragraph::new(shipping.phone.clone()));

        doc.push(elements::Break::new(1.5));

        // --- TABELA DE ITENS ---
        // Pesos das colunas: Produto (4), Qtd (1), Preço (2), Total (2)
        let mut table = elements::TableLayout::new(vec![4, 1, 2, 2]);
        table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

        let style_bold = style::Style::new().bold();
        table
            .row()
            .element(elements::Paragraph::new("Product").styled(style_bold))
            .element(elements::Paragraph::new("Qty").styled(style_bold))
            .element(elements::Paragraph::new("Unit").styled(style_bold))
            .element(elements::Paragraph::new("Total").styled(style_bold))
            .push()
            .map_err(pdf_error)?;

        for item in order.items.iter() {
            table
                .row()
                .element(elements::Paragraph::new(format!("{} ({})", item.name, item.reference)))
                .element(elements::Paragraph::new(item.quantity.to_string()))
                .element(elements::Paragraph::new(money(item.price)))
                .element(elements::Paragraph::new(money(item.line_total())))
                .push()
                .map_err(pdf_error)?;
        }

        doc.push(table);
        doc.push(elements::Break::new(1.5));

        // --- TOTAIS ---
        for (label, value, bold) in [
            ("Subtotal", order.subtotal, false),
            ("Shipping", order.shipping_cost, false),
            ("TOTAL", order.total, true),
        ] {
            let mut paragraph = elements::Paragraph::new(format!("{label}: {}", money(value)));
            paragraph.set_alignment(genpdf::Alignment::Right);
            let style = if bold { style::Style::new().bold().with_font_size(12) } else { style::Style::new() };
            doc.push(paragraph.styled(style));
        }

        doc.push(elements::Break::new(2));

        // --- QR CODE PARA A PÁGINA DO PEDIDO ---
        let url = self.order_url(order);
        let code = QrCode::new(url.as_bytes()).map_err(pdf_error)?;
        let image_buffer = code.render::<Luma<u8>>().build();
        let dynamic_image = image::DynamicImage::ImageLuma8(image_buffer);

        let pdf_image = elements::Image::from_dynamic_image(dynamic_image)
            .map_err(pdf_error)?
            .with_scale(genpdf::Scale::new(0.5, 0.5));
        doc.push(pdf_image);
        doc.push(elements::Paragraph::new(url).styled(style::Style::new().italic().with_font_size(8)));

        // Renderiza em memória
        let mut buffer = Vec::new();
        doc.render(&mut buffer).map_err(pdf_error)?;

        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        cart::{tests::product, LineItem},
        order::{OrderStatus, ShippingInfo},
    };
    use chrono::Utc;
    use sqlx::types::Json;
    use uuid::Uuid;

    fn order() -> Order {
        let item = LineItem::from_product(&product("shirt", "10.00", 3), 2);
        Order {
            id: Uuid::new_v4(),
            display_id: 7,
            user_id: Uuid::new_v4(),
            items: Json(vec![item]),
            shipping: Json(ShippingInfo {
                full_name: "Ana Silva".into(),
                address: "Rua A, 1".into(),
                city: "Lisboa".into(),
                postal_code: "1000-001".into(),
                country: "PT".into(),
                phone: "+351900000000".into(),
            }),
            payment_method: PaymentMethod::CashOnDelivery,
            payment_status: PaymentStatus::Pending,
            payment_intent_id: None,
            paid_at: None,
            status: OrderStatus::Pending,
            subtotal: "20.00".parse().unwrap(),
            shipping_cost: "4.99".parse().unwrap(),
            total: "24.99".parse().unwrap(),
            delivered_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn order_url_has_no_double_slash() {
        let service = DocumentService::new("./fonts".into(), "https://shop.example/".into());
        let order = order();
        assert_eq!(service.order_url(&order), format!("https://shop.example/orders/{}", order.id));
    }

    #[test]
    fn missing_fonts_are_reported() {
        let service = DocumentService::new("/nonexistent/fonts".into(), "https://shop.example".into());
        let err = service.generate_invoice_pdf(&order(), "eur").unwrap_err();
        assert!(matches!(err, AppError::FontNotFound(_)));
    }
}
