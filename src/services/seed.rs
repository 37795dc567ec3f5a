use super::{Record, RecordSource, ServiceResult};
use crate::records::{
    BlogPost, ContactRequest, ContactStatus, PortfolioAttachment, PortfolioItem, Service,
    TeamMember,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Record types that ship with hard-coded sample content.
pub trait Seeded: Record {
    fn seed() -> Vec<Self>;
}

/// Source that yields the sample content; never fails.
pub struct SeedSource<R: Seeded> {
    records: Vec<R>,
}

impl<R: Seeded> Default for SeedSource<R> {
    fn default() -> Self {
        Self { records: R::seed() }
    }
}

#[async_trait]
impl<R: Seeded> RecordSource<R> for SeedSource<R> {
    async fn fetch(&self) -> ServiceResult<Vec<R>> {
        Ok(self.records.clone())
    }
}

pub fn seed_source<R: Seeded>() -> Arc<dyn RecordSource<R>> {
    Arc::new(SeedSource::<R>::default())
}

const IMAGE_BASE: &str =
    "https://cdn.poehali.dev/projects/565ca836-99bb-4807-a3ef-7d3d8deb371f/files";

impl Seeded for PortfolioItem {
    fn seed() -> Vec<Self> {
        vec![
            PortfolioItem {
                id: 1,
                category: "Брендинг".into(),
                client: "TechCorp".into(),
                image_url: format!("{IMAGE_BASE}/3a78e3e0-1179-4b2e-9a34-cfc122dc26ac.jpg"),
                description: Some("Разработка фирменного стиля".into()),
                attachments: vec![
                    PortfolioAttachment {
                        id: 1,
                        file_url: "https://example.com/logo.pdf".into(),
                        file_name: "Логобук.pdf".into(),
                        file_type: Some("pdf".into()),
                        description: Some("Руководство по использованию логотипа".into()),
                    },
                    PortfolioAttachment {
                        id: 2,
                        file_url: "https://example.com/colors.pdf".into(),
                        file_name: "Цветовая палитра.pdf".into(),
                        file_type: Some("pdf".into()),
                        description: None,
                    },
                ],
            },
            PortfolioItem {
                id: 2,
                category: "Иллюстрация".into(),
                client: "Creative Agency".into(),
                image_url: format!("{IMAGE_BASE}/7404f805-2c7e-47c9-afb1-6633158719e5.jpg"),
                description: Some("Серия иллюстраций для сайта".into()),
                attachments: Vec::new(),
            },
            PortfolioItem {
                id: 3,
                category: "UI/UX".into(),
                client: "StartUp Inc".into(),
                image_url: format!("{IMAGE_BASE}/56f2ea5a-4581-4518-9745-f57217efaaa0.jpg"),
                description: Some("Дизайн мобильного приложения".into()),
                attachments: Vec::new(),
            },
        ]
    }
}

impl Seeded for BlogPost {
    fn seed() -> Vec<Self> {
        vec![
            BlogPost {
                id: 1,
                title: "Тренды графического дизайна 2024".into(),
                excerpt: "Обзор главных трендов в мире графического дизайна на предстоящий год"
                    .into(),
                content: "Полный текст статьи о трендах графического дизайна...".into(),
                publish_date: "2024-01-15".into(),
                author: "Анна Петрова".into(),
            },
            BlogPost {
                id: 2,
                title: "Как создать эффективный логотип".into(),
                excerpt: "Пошаговое руководство по разработке запоминающегося логотипа".into(),
                content: "Полный текст статьи о создании логотипов...".into(),
                publish_date: "2024-01-08".into(),
                author: "Дмитрий Соколов".into(),
            },
        ]
    }
}

impl Seeded for TeamMember {
    fn seed() -> Vec<Self> {
        let member = |id: i64, name: &str, role: &str, experience: &str, bio: &str| TeamMember {
            id,
            name: name.into(),
            role: role.into(),
            experience: experience.into(),
            bio: Some(bio.into()),
        };
        vec![
            member(1, "Анна Петрова", "Арт-директор", "10 лет опыта", "Ведущий арт-директор студии"),
            member(2, "Дмитрий Соколов", "Графический дизайнер", "7 лет опыта", "Специалист по брендингу"),
            member(3, "Елена Кузнецова", "Иллюстратор", "5 лет опыта", "Создание авторских иллюстраций"),
            member(4, "Игорь Морозов", "UI/UX дизайнер", "6 лет опыта", "Эксперт по интерфейсам"),
        ]
    }
}

impl Seeded for Service {
    fn seed() -> Vec<Self> {
        let service = |id: i64, title: &str, description: &str, icon: &str| Service {
            id,
            title: title.into(),
            description: description.into(),
            icon: icon.into(),
        };
        vec![
            service(
                1,
                "Брендинг",
                "Создание уникального визуального стиля и фирменного стиля компании",
                "Palette",
            ),
            service(
                2,
                "Иллюстрация",
                "Авторские иллюстрации для веб-сайтов, приложений и печатных изданий",
                "Lightbulb",
            ),
            service(
                3,
                "Графический дизайн",
                "Разработка визуальных материалов: логотипы, плакаты, упаковка",
                "Layers",
            ),
            service(
                4,
                "UI/UX дизайн",
                "Проектирование интерфейсов с фокусом на пользовательский опыт",
                "Layout",
            ),
        ]
    }
}

impl Seeded for ContactRequest {
    fn seed() -> Vec<Self> {
        vec![
            ContactRequest {
                id: 1,
                name: "Иван Сидоров".into(),
                email: "ivan@example.com".into(),
                message: "Здравствуйте! Интересует разработка фирменного стиля для нашей компании. Можете прислать примерную стоимость?".into(),
                status: ContactStatus::New,
                created_at: "2024-01-20T10:30:00".into(),
            },
            ContactRequest {
                id: 2,
                name: "Мария Кузнецова".into(),
                email: "maria@example.com".into(),
                message: "Нужна помощь с дизайном упаковки продукта. Когда можем обсудить детали?".into(),
                status: ContactStatus::Read,
                created_at: "2024-01-19T14:20:00".into(),
            },
            ContactRequest {
                id: 3,
                name: "Алексей Петров".into(),
                email: "alex@example.com".into(),
                message: "Очень понравились ваши работы в портфолио. Хотел бы обсудить сотрудничество.".into(),
                status: ContactStatus::Replied,
                created_at: "2024-01-18T09:15:00".into(),
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seed_sources_match_sample_sizes() {
        assert_eq!(seed_source::<PortfolioItem>().fetch().await.unwrap().len(), 3);
        assert_eq!(seed_source::<BlogPost>().fetch().await.unwrap().len(), 2);
        assert_eq!(seed_source::<TeamMember>().fetch().await.unwrap().len(), 4);
        assert_eq!(seed_source::<Service>().fetch().await.unwrap().len(), 4);
        assert_eq!(seed_source::<ContactRequest>().fetch().await.unwrap().len(), 3);
    }

    #[test]
    fn only_first_portfolio_item_has_attachments() {
        let items = PortfolioItem::seed();
        assert_eq!(items[0].attachments.len(), 2);
        assert!(items[1..].iter().all(|item| item.attachments.is_empty()));
    }
}
