// Access to the institutional directory: lists of students per section and
// lookup pages of people.

use std::path::PathBuf;

use regex::Regex;

use crate::tally::{config_reader::TallyConfig, *};

/// The patterns used to read the pages of the directory.
pub struct PagePatterns {
    /// Opening and closing `ul` and `a` tags.
    element: Regex,
    tag: Regex,
    username: Regex,
    obfuscated: Regex,
}

impl PagePatterns {
    pub fn new() -> TallyResult<PagePatterns> {
        Ok(PagePatterns {
            element: Regex::new(r"(?is)<(/?)(ul|a)\b[^>]*>").context(InvalidPatternSnafu {})?,
            tag: Regex::new(r"(?s)<[^>]*>").context(InvalidPatternSnafu {})?,
            username: Regex::new(r"documentURI\.replace\(re,\s*'([^']+)'\)")
                .context(InvalidPatternSnafu {})?,
            obfuscated: Regex::new(r"var re = /([^/]+)/").context(InvalidPatternSnafu {})?,
        })
    }

    /// The names of the students on a section page: the text of every link
    /// nested at any depth inside a list.
    pub fn extract_names_from_html(&self, html: &str) -> Vec<String> {
        let mut res: Vec<String> = Vec::new();
        let mut depth: usize = 0;
        let mut link_start: Option<usize> = None;
        for c in self.element.captures_iter(html) {
            let (m, closing) = match (c.get(0), c.get(1)) {
                (Some(m), Some(slash)) => (m, !slash.as_str().is_empty()),
                _ => continue,
            };
            let is_list = c[2].eq_ignore_ascii_case("ul");
            match (is_list, closing) {
                (true, false) => depth += 1,
                (true, true) => depth = depth.saturating_sub(1),
                (false, false) => link_start = (depth > 0).then(|| m.end()),
                (false, true) => {
                    if let Some(start) = link_start.take() {
                        let text = self.tag.replace_all(&html[start..m.start()], "");
                        let name = decode_entities(text.trim());
                        if !name.is_empty() {
                            res.push(name);
                        }
                    }
                }
            }
        }
        res
    }

    /// The mail username (firstname.lastname) on the page of a person.
    pub fn find_mail_username(&self, html: &str, identifier: u64) -> Result<String, VotingErrors> {
        if let Some(c) = self.username.captures(html) {
            return Ok(c[1].to_string());
        }
        let detail = match self.obfuscated.captures(html) {
            Some(c) => format!("no username for the address {}", &c[1]),
            None => "no address on the page".to_string(),
        };
        Err(VotingErrors::Resolution { identifier, detail })
    }
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Fetches a page. Failures are logged and reported as None.
pub fn fetch_html(agent: &ureq::Agent, url: &str) -> Option<String> {
    debug!("fetch_html: {}", url);
    match agent.get(url).call() {
        Ok(response) => match response.into_string() {
            Ok(s) => Some(s),
            Err(e) => {
                warn!("Error reading the content of {}: {}", url, e);
                None
            }
        },
        Err(e) => {
            warn!("Error fetching the URL {}: {}", url, e);
            None
        }
    }
}

pub struct WebDirectory {
    agent: ureq::Agent,
    patterns: PagePatterns,
    section_lists_folder: PathBuf,
    config: TallyConfig,
}

impl WebDirectory {
    pub fn new(config: &TallyConfig) -> TallyResult<WebDirectory> {
        Ok(WebDirectory {
            agent: ureq::AgentBuilder::new().build(),
            patterns: PagePatterns::new()?,
            section_lists_folder: PathBuf::from(&config.section_lists_folder),
            config: config.clone(),
        })
    }

    fn section_list_path(&self, section: &str) -> PathBuf {
        self.section_lists_folder.join(section)
    }

    /// Downloads the list of students of a section and saves it, one name per line.
    /// If the page cannot be fetched, the previous list is kept.
    pub fn save_section_list(&self, section: &str) -> TallyResult<()> {
        let url = self.config.section_list_url(section);
        let html = match fetch_html(&self.agent, &url) {
            Some(html) => html,
            None => {
                warn!("Keeping the previous list of section {}", section);
                return Ok(());
            }
        };
        let names = self.patterns.extract_names_from_html(&html);
        let path = self.section_list_path(section);
        fs::create_dir_all(&self.section_lists_folder).context(WritingFileSnafu {
            path: self.section_lists_folder.display().to_string(),
        })?;
        fs::write(&path, names.join("\n")).context(WritingFileSnafu {
            path: path.display().to_string(),
        })?;
        info!(
            "Content from {} has been saved to {} ({} names).",
            url,
            path.display(),
            names.len()
        );
        Ok(())
    }
}

/// Refreshes the saved lists of every section.
pub fn update_section_lists(directory: &WebDirectory, layout: &SectionLayout) -> TallyResult<()> {
    for section in layout.sections() {
        directory.save_section_list(section)?;
    }
    Ok(())
}

impl Directory for WebDirectory {
    fn section_members(&self, section: &str) -> Option<String> {
        let path = self.section_list_path(section);
        match fs::read_to_string(&path) {
            Ok(s) => Some(s),
            Err(e) => {
                warn!("The file {} could not be read: {}", path.display(), e);
                None
            }
        }
    }

    fn mail_username(&self, identifier: u64) -> Result<Option<String>, VotingErrors> {
        let url = self.config.people_url(identifier);
        match fetch_html(&self.agent, &url) {
            Some(html) => self
                .patterns
                .find_mail_username(&html, identifier)
                .map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECTION_PAGE: &str = r#"<html><body>
<h1>etudiants.sv@epfl.ch</h1>
<p><a href="/help">Help</a></p>
<ul>
  <li><a href="/people/1">Anna   Meier</a></li>
  <li><a href="/people/2"><b>Bruno</b> Keller</a></li>
  <li><a href="/people/3">Zo&#39;e Müller-Lang &amp; Co</a></li>
</ul>
<UL class="more"><li><a href="/people/4">
  Chloé Favre
</a></li></UL>
</body></html>"#;

    const PEOPLE_PAGE: &str = r#"<script>
var re = /anna\.meier@epfl\.ch/;
document.getElementById('email').innerHTML = documentURI.replace(re, 'anna.meier');
</script>"#;

    #[test]
    fn names_from_section_page() {
        let p = PagePatterns::new().unwrap();
        let names = p.extract_names_from_html(SECTION_PAGE);
        assert_eq!(
            names,
            vec![
                "Anna   Meier",
                "Bruno Keller",
                "Zo'e Müller-Lang & Co",
                "Chloé Favre"
            ]
        );
    }

    #[test]
    fn names_from_nested_lists() {
        let p = PagePatterns::new().unwrap();
        let html = "<ul><li>Group<ul><li><a>Anna Meier</a></li></ul></li>\
                    <li><a href=\"/b\">Bruno Keller</a></li></ul>\
                    <p><a>Outside</a></p><abbr>x</abbr>";
        assert_eq!(
            p.extract_names_from_html(html),
            vec!["Anna Meier", "Bruno Keller"]
        );
    }

    #[test]
    fn names_from_empty_page() {
        let p = PagePatterns::new().unwrap();
        assert!(p.extract_names_from_html("<html></html>").is_empty());
    }

    #[test]
    fn username_from_people_page() {
        let p = PagePatterns::new().unwrap();
        assert_eq!(
            p.find_mail_username(PEOPLE_PAGE, 123456),
            Ok("anna.meier".to_string())
        );
    }

    #[test]
    fn username_missing() {
        let p = PagePatterns::new().unwrap();
        let res = p.find_mail_username("<script>var re = /x@epfl\\.ch/;</script>", 7);
        match res {
            Err(VotingErrors::Resolution { identifier, detail }) => {
                assert_eq!(identifier, 7);
                assert!(detail.contains("x@epfl"));
            }
            x => panic!("unexpected {:?}", x),
        }
        assert!(matches!(
            p.find_mail_username("", 8),
            Err(VotingErrors::Resolution { identifier: 8, .. })
        ));
    }

    #[test]
    fn missing_section_list_is_not_a_member() {
        let config = TallyConfig {
            section_lists_folder: "does/not/exist".to_string(),
            ..TallyConfig::default()
        };
        let d = WebDirectory::new(&config).unwrap();
        assert_eq!(d.section_members("sv"), None);
    }
}
