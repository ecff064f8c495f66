/// A small loan approval dataset. Applicants with a credit score of at least 665 are approved.
pub const LOAN_CSV: &str = "age,income,education_years,debt_ratio,credit_score,job_type,home_status,loan_approved
34,72000,16,0.25,720,Professional,Own,Approved
45,38000,12,0.55,580,Service,Rent,Denied
29,65000,14,0.31,690,Technical,Mortgage,Approved
52,41000,10,0.62,610,Service,Rent,Denied
38,98000,18,0.18,750,Management,Own,Approved
23,29000,12,0.71,540,Office,Rent,Denied
41,70000,16,0.35,700,Technical,Mortgage,Approved
36,45000,13,0.48,630,Service,Rent,Denied
31,68000,15,0.29,680,Professional,Mortgage,Approved
27,33000,11,0.66,560,Office,Rent,Denied
48,88000,17,0.22,735,Management,Own,Approved
33,36000,12,0.58,595,Office,Rent,Denied
39,76000,16,0.27,710,Professional,Mortgage,Approved
44,43000,12,0.51,620,Service,Mortgage,Denied
26,61000,15,0.33,665,Technical,Rent,Approved
58,39000,10,0.69,550,Office,Own,Denied
35,82000,18,0.2,760,Management,Own,Approved
30,47000,14,0.45,640,Service,Rent,Denied
42,74000,16,0.3,695,Professional,Mortgage,Approved
37,35000,11,0.6,570,Office,Rent,Denied
";
