//! Importance score: how strongly a book deserves to be read next.
//!
//! The score is the sum of five weights: type, availability, priority,
//! publication year and category. All text is trimmed before lookup and
//! unknown values weigh zero.

use crate::library::record::{Book, KIND_TECHNICAL};

/// Weight per category.
pub const CATEGORY_WEIGHTS: [(&str, u32); 19] = [
    ("Alta Performance & Foco", 8),
    ("Liderança & Pensamento Estratégico", 7),
    ("Arquitetura da Mente (Mindset)", 7),
    ("Artesanato de Software (Clean Code)", 6),
    ("Sistemas de IA & LLMs", 9),
    ("Storytelling & Visualização", 5),
    ("Biohacking & Existência", 5),
    ("Literatura Brasileira Clássica", 6),
    ("Épicos & Ficção Reflexiva", 7),
    ("Justiça Social & Interseccionalidade", 4),
    ("Negócios & Estratégia", 3),
    ("Liberdade Econômica & Finanças", 5),
    ("Cosmologia & Fronteiras da Ciência", 8),
    ("Estatística & Incerteza", 7),
    ("Engenharia de ML & MLOps", 8),
    ("Arquitetura de Sistemas Digitais", 5),
    ("Design & UX", 3),
    ("Noir & Engenharia do Mistério", 5),
    ("Comunicação & Influência", 6),
];

/// Availability that earns the "already on the shelf" bonus.
pub const SHELF: &str = "Estante";

pub fn category_weight(category: &str) -> u32 {
    let category = category.trim();
    CATEGORY_WEIGHTS
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, w)| *w)
        .unwrap_or(0)
}

/// Names of all weighted categories, in table order.
pub fn category_names() -> Vec<&'static str> {
    CATEGORY_WEIGHTS.iter().map(|(name, _)| *name).collect()
}

pub fn kind_weight(kind: &str) -> u32 {
    if kind.trim() == KIND_TECHNICAL {
        4
    } else {
        2
    }
}

pub fn availability_weight(availability: &str) -> u32 {
    if availability.trim() == SHELF {
        2
    } else {
        0
    }
}

pub fn priority_weight(priority: &str) -> u32 {
    match priority.trim() {
        "1 - Baixa" => 1,
        "2 - Média" => 4,
        "3 - Média-Alta" => 7,
        "4 - Alta" => 10,
        _ => 0,
    }
}

/// Older books weigh less; a missing or non-positive year weighs nothing.
pub fn year_weight(year: Option<i32>) -> u32 {
    match year {
        Some(y) if y > 0 && y <= 2005 => 4,
        Some(y) if (2006..=2021).contains(&y) => 7,
        Some(y) if y >= 2022 => 9,
        _ => 0,
    }
}

/// The importance score of `book`.
pub fn importance_score(book: &Book) -> u32 {
    kind_weight(&book.kind)
        + availability_weight(&book.availability)
        + priority_weight(&book.priority)
        + year_weight(book.year)
        + category_weight(&book.category)
}
