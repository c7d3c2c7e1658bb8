use super::types::{Category, Food};

/// The five fixed categories. Ids are stable and shared with the companion
/// REST backend's database seed.
pub fn default_categories() -> Vec<Category> {
    [
        (1, "한식", "🍚"),
        (2, "중식", "🥟"),
        (3, "양식", "🍝"),
        (4, "일식", "🍣"),
        (5, "분식", "🍢"),
    ]
    .into_iter()
    .map(|(id, name, emoji)| Category {
        id,
        name: name.to_string(),
        emoji: emoji.to_string(),
        active: true,
    })
    .collect()
}

/// Seed menu, ten items per category. Same names and emoji as the backend
/// seed script; ids are assigned sequentially from 1.
const DEFAULT_MENUS: &[(&str, &str, i64)] = &[
    // 한식
    ("김치찌개", "🍲", 1),
    ("비빔밥", "🍚", 1),
    ("불고기", "🥩", 1),
    ("삼겹살", "🥓", 1),
    ("된장찌개", "🥘", 1),
    ("제육볶음", "🍖", 1),
    ("갈비탕", "🍲", 1),
    ("냉면", "🍜", 1),
    ("순두부찌개", "🥘", 1),
    ("닭갈비", "🍗", 1),
    // 중식
    ("짜장면", "🍝", 2),
    ("짬뽕", "🍜", 2),
    ("탕수육", "🍖", 2),
    ("마파두부", "🥘", 2),
    ("마라탕", "🍲", 2),
    ("양장피", "🥗", 2),
    ("깐풍기", "🍗", 2),
    ("유린기", "🍗", 2),
    ("볶음밥", "🍚", 2),
    ("만두", "🥟", 2),
    // 양식
    ("파스타", "🍝", 3),
    ("피자", "🍕", 3),
    ("햄버거", "🍔", 3),
    ("스테이크", "🥩", 3),
    ("리조또", "🍚", 3),
    ("오믈렛", "🍳", 3),
    ("샐러드", "🥗", 3),
    ("샌드위치", "🥪", 3),
    ("치킨", "🍗", 3),
    ("감자튀김", "🍟", 3),
    // 일식
    ("초밥", "🍣", 4),
    ("라멘", "🍜", 4),
    ("돈카츠", "🍱", 4),
    ("우동", "🍜", 4),
    ("사시미", "🍣", 4),
    ("규동", "🍚", 4),
    ("카레", "🍛", 4),
    ("타코야키", "🐙", 4),
    ("오코노미야키", "🥞", 4),
    ("텐동", "🍤", 4),
    // 분식
    ("떡볶이", "🍢", 5),
    ("순대", "🌭", 5),
    ("튀김", "🍤", 5),
    ("김밥", "🍙", 5),
    ("라면", "🍜", 5),
    ("쫄면", "🍜", 5),
    ("비빔당면", "🍜", 5),
    ("오뎅", "🍢", 5),
    ("호떡", "🥞", 5),
    ("붕어빵", "🐟", 5),
];

pub fn default_menus() -> Vec<Food> {
    DEFAULT_MENUS
        .iter()
        .enumerate()
        .map(|(i, (name, emoji, category_id))| Food {
            id: i as i64 + 1,
            name: name.to_string(),
            emoji: emoji.to_string(),
            category_id: *category_id,
            description: None,
            image_url: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_categories_all_active() {
        let categories = default_categories();
        assert_eq!(categories.len(), 5);
        assert!(categories.iter().all(|c| c.active));
        assert_eq!(categories[0].name, "한식");
        assert_eq!(categories[4].name, "분식");
    }

    #[test]
    fn fifty_menus_with_sequential_ids() {
        let menus = default_menus();
        assert_eq!(menus.len(), 50);
        for (i, menu) in menus.iter().enumerate() {
            assert_eq!(menu.id, i as i64 + 1);
        }
    }

    #[test]
    fn every_menu_references_a_seed_category() {
        let category_ids: Vec<i64> = default_categories().iter().map(|c| c.id).collect();
        for menu in default_menus() {
            assert!(category_ids.contains(&menu.category_id), "{}", menu.name);
        }
    }

    #[test]
    fn ten_menus_per_category() {
        let menus = default_menus();
        for category_id in 1..=5 {
            let count = menus.iter().filter(|m| m.category_id == category_id).count();
            assert_eq!(count, 10);
        }
    }
}
