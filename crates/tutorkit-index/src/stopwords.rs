/// Russian stop words excluded from TF-IDF vocabulary.
///
/// A trimmed-down frequency list of function words plus the two domain
/// additions «это» and «нею».
static RUSSIAN_STOPWORDS: &[&str] = &[
    "и", "в", "во", "не", "что", "он", "на", "я", "с", "со", "как", "а", "то", "все", "она",
    "так", "его", "но", "да", "ты", "к", "у", "же", "вы", "за", "бы", "по", "только", "ее",
    "мне", "было", "вот", "от", "меня", "еще", "нет", "о", "из", "ему", "теперь", "когда",
    "даже", "ну", "вдруг", "ли", "если", "уже", "или", "ни", "быть", "был", "него", "до",
    "вас", "нибудь", "опять", "уж", "вам", "ведь", "там", "потом", "себя", "ничего", "ей",
    "может", "они", "тут", "где", "есть", "надо", "ней", "для", "мы", "тебя", "их", "чем",
    "была", "сам", "чтоб", "без", "будто", "чего", "раз", "тоже", "себе", "под", "будет",
    "тогда", "кто", "этот", "того", "потому", "этого", "какой", "совсем", "ним", "здесь",
    "этом", "один", "почти", "мой", "тем", "чтобы", "нее", "сейчас", "были", "куда", "зачем",
    "всех", "никогда", "можно", "при", "об", "хотя", "эти", "нас", "про", "них", "какая",
    "много", "разве", "эту", "моя", "свою", "этой", "перед", "иногда", "лучше", "чуть", "том",
    "такой", "им", "более", "всегда", "конечно", "всю", "между",
    // domain additions
    "это", "нею",
];

pub fn is_stopword(token: &str) -> bool {
    RUSSIAN_STOPWORDS.contains(&token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_words_filtered() {
        assert!(is_stopword("это"));
        assert!(is_stopword("нею"));
        assert!(is_stopword("и"));
        assert!(!is_stopword("диаграмма"));
    }
}
