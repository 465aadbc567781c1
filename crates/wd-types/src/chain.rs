use serde::{Deserialize, Serialize};

/// Token and metadata protocols layered on the base ledger.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AssetStandard {
    /// Ordinal-style inscriptions.
    Ordinals,
    /// Fungible ticker tokens.
    Brc20,
    /// Secondary smart-asset protocol (ARC-20 and realms).
    Atomicals,
    /// Native multi-asset protocol.
    Runes,
}

impl AssetStandard {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "ordinals" => Some(AssetStandard::Ordinals),
            "brc20" => Some(AssetStandard::Brc20),
            "atomicals" => Some(AssetStandard::Atomicals),
            "runes" => Some(AssetStandard::Runes),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AssetStandard::Ordinals => "ordinals",
            AssetStandard::Brc20 => "brc20",
            AssetStandard::Atomicals => "atomicals",
            AssetStandard::Runes => "runes",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AssetStandard::Ordinals => "Ordinals",
            AssetStandard::Brc20 => "BRC-20",
            AssetStandard::Atomicals => "Atomicals",
            AssetStandard::Runes => "Runes",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ChainType {
    BitcoinMainnet,
    BitcoinTestnet,
    BitcoinTestnet4,
    BitcoinSignet,
    FractalMainnet,
    FractalTestnet,
}

impl ChainType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "bitcoin_mainnet" => Some(ChainType::BitcoinMainnet),
            "bitcoin_testnet" => Some(ChainType::BitcoinTestnet),
            "bitcoin_testnet4" => Some(ChainType::BitcoinTestnet4),
            "bitcoin_signet" => Some(ChainType::BitcoinSignet),
            "fractal_mainnet" => Some(ChainType::FractalMainnet),
            "fractal_testnet" => Some(ChainType::FractalTestnet),
            _ => None,
        }
    }

    /// Static capability record for this chain.
    pub fn capabilities(self) -> ChainCapabilities {
        const ALL: &[AssetStandard] = &[
            AssetStandard::Ordinals,
            AssetStandard::Brc20,
            AssetStandard::Atomicals,
            AssetStandard::Runes,
        ];
        const NO_ATOMICALS: &[AssetStandard] = &[
            AssetStandard::Ordinals,
            AssetStandard::Brc20,
            AssetStandard::Runes,
        ];

        let (standards, show_price, view_tx_history_internally, explorer_url) = match self {
            ChainType::BitcoinMainnet => (ALL, true, false, "https://mempool.space"),
            ChainType::BitcoinTestnet => (NO_ATOMICALS, false, false, "https://mempool.space/testnet"),
            ChainType::BitcoinTestnet4 => (NO_ATOMICALS, false, false, "https://mempool.space/testnet4"),
            ChainType::BitcoinSignet => (NO_ATOMICALS, false, false, "https://mempool.space/signet"),
            ChainType::FractalMainnet => (NO_ATOMICALS, true, true, "https://mempool.fractalbitcoin.io"),
            ChainType::FractalTestnet => (NO_ATOMICALS, false, true, "https://mempool-testnet.fractalbitcoin.io"),
        };

        ChainCapabilities {
            chain: self,
            standards,
            show_price,
            view_tx_history_internally,
            explorer_url,
        }
    }
}

/// Which asset standards and behaviours a chain enables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainCapabilities {
    pub chain: ChainType,
    /// Supported standards in tab display order.
    pub standards: &'static [AssetStandard],
    pub show_price: bool,
    pub view_tx_history_internally: bool,
    pub explorer_url: &'static str,
}

impl ChainCapabilities {
    pub fn supports(&self, standard: AssetStandard) -> bool {
        self.standards.contains(&standard)
    }

    pub fn buy_enabled(&self) -> bool {
        self.chain == ChainType::BitcoinMainnet
    }
}
