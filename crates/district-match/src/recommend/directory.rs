use super::table::InfluenceTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Housing price band used to narrow the candidate districts before ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceTier {
    #[serde(alias = "상")]
    High,
    #[serde(alias = "중")]
    Mid,
    #[serde(alias = "하")]
    Low,
}

impl PriceTier {
    pub const ALL: [PriceTier; 3] = [PriceTier::High, PriceTier::Mid, PriceTier::Low];

    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "상",
            Self::Mid => "중",
            Self::Low => "하",
        }
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Mid => "mid",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for PriceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for PriceTier {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" | "상" => Ok(Self::High),
            "mid" | "middle" | "중" => Ok(Self::Mid),
            "low" | "하" => Ok(Self::Low),
            other => Err(format!(
                "unknown price tier '{other}' (expected high, mid, or low)"
            )),
        }
    }
}

const SEOUL_DISTRICTS: [(&str, PriceTier, &str, &str); 25] = [
    ("강남구", PriceTier::High, "https://www.gangnam.go.kr", "서울의 경제·문화 중심, 높은 생활 인프라"),
    ("강동구", PriceTier::Mid, "https://www.gangdong.go.kr", "쾌적한 주거환경과 한강변 녹지 조성"),
    ("강북구", PriceTier::Low, "https://www.gangbuk.go.kr", "북한산 자락의 자연 친화적 도시"),
    ("강서구", PriceTier::Low, "https://www.gangseo.seoul.kr", "김포공항 인접, 서남권 관문도시"),
    ("관악구", PriceTier::Low, "https://www.gwanak.go.kr", "대학가 중심의 젊은 분위기와 문화"),
    ("광진구", PriceTier::High, "https://www.gwangjin.go.kr", "건대입구 중심의 상권·문화 중심지"),
    ("구로구", PriceTier::Low, "https://www.guro.go.kr", "IT산업단지와 남부 생활거점"),
    ("금천구", PriceTier::Low, "https://www.geumcheon.go.kr", "첨단산업 중심의 도심형 자족도시"),
    ("노원구", PriceTier::Low, "https://www.nowon.kr", "북부 주거 중심지, 교육환경 우수"),
    ("도봉구", PriceTier::Low, "https://www.dobong.go.kr", "자연과 조화된 조용한 주거지역"),
    ("동대문구", PriceTier::Mid, "https://www.ddm.go.kr", "패션과 상업 중심, 교통 접근성 우수"),
    ("동작구", PriceTier::High, "https://www.dongjak.go.kr", "한강변 주거·교육 환경 우수"),
    ("마포구", PriceTier::Mid, "https://www.mapo.go.kr", "홍대·상수 중심의 젊은 문화 중심지"),
    ("서대문구", PriceTier::Mid, "https://www.sdm.go.kr", "연세대·이화여대 등 학문 중심지"),
    ("서초구", PriceTier::High, "https://www.seocho.go.kr", "예술의전당·교육 중심의 고급 주거지"),
    ("성동구", PriceTier::Mid, "https://www.sd.go.kr", "성수·왕십리 개발로 급부상한 지역"),
    ("성북구", PriceTier::Low, "https://www.sb.go.kr", "고려대·성신여대 등 교육·문화 중심"),
    ("송파구", PriceTier::High, "https://www.songpa.go.kr", "잠실 중심의 주거·상업 복합지역, 편리한 교통망"),
    ("양천구", PriceTier::High, "https://www.yangcheon.go.kr", "목동 중심의 교육특화·쾌적 주거지"),
    ("영등포구", PriceTier::Mid, "https://www.ydp.go.kr", "여의도 금융·비즈니스 중심지"),
    ("용산구", PriceTier::High, "https://www.yongsan.go.kr", "한강변 국제업무지구로 발전 중"),
    ("은평구", PriceTier::Mid, "https://www.ep.go.kr", "북서부 교통 요충지, 자연 친화적"),
    ("종로구", PriceTier::High, "https://www.jongno.go.kr", "서울의 역사·행정 중심지"),
    ("중구", PriceTier::Mid, "https://www.junggu.seoul.kr", "도심 상업 중심, 접근성 최상"),
    ("중랑구", PriceTier::Mid, "https://www.jungnang.seoul.kr", "동북권 주거지, 서울 외곽 접근 용이"),
];

/// Static district → price tier assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TierMap {
    tiers: BTreeMap<String, PriceTier>,
}

impl TierMap {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, PriceTier)>,
        S: Into<String>,
    {
        Self {
            tiers: entries
                .into_iter()
                .map(|(district, tier)| (district.into(), tier))
                .collect(),
        }
    }

    /// Price tiers of the 25 Seoul districts.
    pub fn seoul() -> Self {
        Self::new(
            SEOUL_DISTRICTS
                .iter()
                .map(|(district, tier, _, _)| (*district, *tier)),
        )
    }

    pub fn tier_of(&self, district: &str) -> Option<PriceTier> {
        self.tiers.get(district.trim()).copied()
    }

    pub fn districts_in(&self, tier: PriceTier) -> impl Iterator<Item = &str> {
        self.tiers
            .iter()
            .filter(move |(_, assigned)| **assigned == tier)
            .map(|(district, _)| district.as_str())
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }
}

/// Restricts `table` to districts assigned `tier`, preserving table order and values.
///
/// Districts without an assignment never match.
pub fn filter_by_tier(table: &InfluenceTable, tiers: &TierMap, tier: PriceTier) -> InfluenceTable {
    table.retain_rows(|row| tiers.tier_of(row.district()) == Some(tier))
}

/// Public-facing description of a district shown next to a recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistrictProfile {
    pub homepage: String,
    pub summary: String,
}

impl DistrictProfile {
    fn unknown() -> Self {
        Self {
            homepage: "#".to_string(),
            summary: "정보 없음".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DistrictDirectory {
    profiles: BTreeMap<String, DistrictProfile>,
}

impl DistrictDirectory {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, DistrictProfile)>,
        S: Into<String>,
    {
        Self {
            profiles: entries
                .into_iter()
                .map(|(district, profile)| (district.into(), profile))
                .collect(),
        }
    }

    pub fn seoul() -> Self {
        Self::new(SEOUL_DISTRICTS.iter().map(|(district, _, homepage, summary)| {
            (
                *district,
                DistrictProfile {
                    homepage: (*homepage).to_string(),
                    summary: (*summary).to_string(),
                },
            )
        }))
    }

    pub fn profile(&self, district: &str) -> DistrictProfile {
        self.profiles
            .get(district.trim())
            .cloned()
            .unwrap_or_else(DistrictProfile::unknown)
    }
}
