use rust_decimal::Decimal;

use super::domain::NewCategory;

/// Category with the criteria it starts out with.
#[derive(Debug)]
pub struct CategoryTemplate {
    pub name: &'static str,
    pub description: &'static str,
    pub weight_percent: u32,
    pub criteria: Vec<(&'static str, &'static str)>,
}

impl CategoryTemplate {
    pub fn new_category(&self) -> NewCategory {
        NewCategory {
            name: self.name.to_string(),
            description: Some(self.description.to_string()),
            weight: Decimal::from(self.weight_percent),
        }
    }
}

/// Starter catalog whose weights total 100%.
#[derive(Debug)]
pub struct CategoryBlueprint {
    categories: Vec<CategoryTemplate>,
}

impl CategoryBlueprint {
    pub fn standard() -> Self {
        Self {
            categories: standard_categories(),
        }
    }

    pub fn categories(&self) -> &[CategoryTemplate] {
        &self.categories
    }

    pub fn total_weight(&self) -> Decimal {
        self.categories
            .iter()
            .map(|template| Decimal::from(template.weight_percent))
            .sum()
    }
}

fn standard_categories() -> Vec<CategoryTemplate> {
    vec![
        CategoryTemplate {
            name: "Technical Skills",
            description: "Depth and quality of the technical work delivered.",
            weight_percent: 40,
            criteria: vec![
                (
                    "Code Quality",
                    "Writes readable, tested code that follows team conventions.",
                ),
                (
                    "Problem Solving",
                    "Breaks down ambiguous problems and picks pragmatic solutions.",
                ),
                (
                    "Technical Knowledge",
                    "Understands the systems and tools used by the team.",
                ),
            ],
        },
        CategoryTemplate {
            name: "Communication",
            description: "Clarity and timeliness of written and spoken communication.",
            weight_percent: 30,
            criteria: vec![
                (
                    "Written Communication",
                    "Keeps documents, tickets, and reviews clear and current.",
                ),
                (
                    "Collaboration",
                    "Works openly with peers and shares context early.",
                ),
            ],
        },
        CategoryTemplate {
            name: "Delivery",
            description: "Reliability in planning and shipping committed work.",
            weight_percent: 30,
            criteria: vec![
                (
                    "Ownership",
                    "Follows work through to completion and raises risks early.",
                ),
                (
                    "Reliability",
                    "Meets commitments or renegotiates them before they slip.",
                ),
            ],
        },
    ]
}
