use serde::{ Deserialize, Serialize };

/// One `[month, amount]` row of the monthly revenue endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct MonthlyRevenue(pub String, pub f64);

#[derive(Clone, Debug, Deserialize)]
pub struct CriticalStock {
    pub nombre: String,
    #[serde(default)]
    pub stock: f64,
}

/// Label/value pairs ready to be drawn as a bar chart.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChartSeries {
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartSeries {
    pub fn from_revenue(rows: Vec<MonthlyRevenue>) -> Self {
        let (labels, values) = rows
            .into_iter()
            .map(|MonthlyRevenue(month, amount)| (month, amount))
            .unzip();
        Self { title: "Ingresos mensuales".to_string(), labels, values }
    }

    pub fn from_stock(rows: Vec<CriticalStock>) -> Self {
        let (labels, values) = rows
            .into_iter()
            .map(|p| (p.nombre, p.stock))
            .unzip();
        Self { title: "Stock disponible".to_string(), labels, values }
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn max_value(&self) -> f64 {
        self.values.iter().cloned().fold(0.0, f64::max)
    }
}
